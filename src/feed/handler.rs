//! Feed handler: snapshot sync, sequence tracking, incremental dispatch.
//!
//! Owns the run loop and is the only component that touches I/O. A session
//! is: connect, subscribe to the `full` channel, seed the book from a REST
//! snapshot, then apply incremental events in strict sequence order. Gaps
//! trigger an in-place resync; transport and decode failures tear the
//! session down and reconnect with exponential backoff.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn, Level};

use crate::book::order::{parse_decimal, Order, Side};
use crate::book::Book;
use crate::coinbase::types::{BookSnapshot, SnapshotEntry};
use crate::coinbase::{CoinbaseClient, SnapshotThrottle};
use crate::config::Config;
use crate::error::{BookError, FeedError};
use crate::feed::listeners::{BookListener, RawFeedListener};
use crate::feed::messages::{Change, FeedMessage, Match};

/// Book depth requested from the snapshot endpoint: level 3 is per-order
/// granularity, which the incremental protocol requires.
const SNAPSHOT_LEVEL: u8 = 3;

/// Ceiling for the exponential reconnect backoff.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// What [`FeedHandler::process_message`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Subscription acknowledgement; no state effect.
    Acknowledged,
    /// Sequence at or below the book's; already covered by the snapshot or
    /// a replayed event. Dropped.
    Stale,
    /// Applied to the book and fanned out to listeners.
    Applied,
    /// Sequence gap: the stream is no longer trustworthy and the caller
    /// must resync before applying anything further.
    NeedsResync,
}

/// Maintains the book from the exchange feed and fans out updates.
///
/// Single-task by construction: the book, the sequence cursor and all
/// listeners are owned here and every mutation happens between suspension
/// points, so no event is ever half-applied.
pub struct FeedHandler {
    config: Config,
    client: CoinbaseClient,
    book: Book,
    sequence: i64,
    book_listeners: Vec<Box<dyn BookListener + Send>>,
    raw_listeners: Vec<Box<dyn RawFeedListener + Send>>,
    snapshot_throttle: SnapshotThrottle,
}

impl FeedHandler {
    pub fn new(config: Config, client: CoinbaseClient) -> Self {
        let book = Book::new(config.product_id.clone());
        Self {
            client,
            book,
            sequence: 0,
            book_listeners: Vec::new(),
            raw_listeners: Vec::new(),
            snapshot_throttle: SnapshotThrottle::new(),
            config,
        }
    }

    /// Registers a book listener. Call before [`run`](Self::run); listener
    /// registration is not synchronized with a running handler.
    pub fn add_book_listener(&mut self, listener: Box<dyn BookListener + Send>) {
        self.book_listeners.push(listener);
    }

    pub fn add_raw_listener(&mut self, listener: Box<dyn RawFeedListener + Send>) {
        self.raw_listeners.push(listener);
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Sequence number of the last applied event (0 before the first sync).
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Runs sessions forever, reconnecting on failure.
    ///
    /// Exits only with the process (shutdown is an external `select!`
    /// against the signal handler).
    pub async fn run(&mut self) {
        let mut backoff = Backoff::new(self.config.reconnect_delay);
        loop {
            let error = match self.session().await {
                Ok(()) => FeedError::ConnectionClosed,
                Err(error) => error,
            };
            error!(%error, "feed session ended");

            // A session that got as far as syncing earns a fresh backoff.
            if self.sequence > 0 {
                backoff.reset();
            }
            self.flush_clear();
            self.book.clear();
            self.sequence = 0;

            let delay = backoff.next_delay();
            info!(delay_secs = delay.as_secs(), "reconnecting after backoff");
            sleep(delay).await;
        }
    }

    /// One connection lifetime: subscribe, sync, stream until error.
    async fn session(&mut self) -> Result<(), FeedError> {
        info!(
            url = %self.config.ws_url,
            product_id = %self.config.product_id,
            "connecting to feed"
        );
        let (stream, _) = connect_async(self.config.ws_url.as_str()).await?;
        let (mut write, mut read) = stream.split();

        // Subscribe before fetching the snapshot so the stream covers the
        // snapshot window; overlap is resolved by sequence comparison.
        let subscribe = json!({
            "type": "subscribe",
            "channels": [{ "name": "full", "product_ids": [self.config.product_id] }],
        });
        write.send(Message::Text(subscribe.to_string().into())).await?;

        self.sync_book().await?;

        while let Some(frame) = read.next().await {
            match frame? {
                Message::Text(text) => {
                    if self.process_message(&text)? == Outcome::NeedsResync {
                        self.resync().await?;
                    }
                }
                Message::Ping(payload) => write.send(Message::Pong(payload)).await?,
                Message::Pong(_) => {}
                Message::Close(frame) => {
                    info!(frame = ?frame, "close frame received");
                    return Err(FeedError::ConnectionClosed);
                }
                Message::Binary(_) => warn!("ignoring unexpected binary frame"),
                Message::Frame(_) => {}
            }
        }
        Err(FeedError::ConnectionClosed)
    }

    /// Decodes one inbound frame and applies it if it is the next event.
    ///
    /// Events are applied in strictly ascending sequence order: replays are
    /// dropped, gaps are reported as [`Outcome::NeedsResync`] without
    /// applying anything. Errors returned here are session-fatal (decode
    /// failures, upstream contract violations).
    pub fn process_message(&mut self, raw: &str) -> Result<Outcome, FeedError> {
        let message: FeedMessage = serde_json::from_str(raw)?;

        if message.kind == "subscriptions" {
            info!("subscription acknowledged");
            return Ok(Outcome::Acknowledged);
        }

        if message.sequence <= self.sequence {
            debug!(
                sequence = message.sequence,
                current = self.sequence,
                "dropping replayed message"
            );
            return Ok(Outcome::Stale);
        }

        if message.sequence != self.sequence + 1 {
            warn!(
                sequence = message.sequence,
                expected = self.sequence + 1,
                "sequence gap detected"
            );
            return Ok(Outcome::NeedsResync);
        }

        self.sequence = message.sequence;
        self.flush_raw(raw);
        self.apply(&message)?;
        Ok(Outcome::Applied)
    }

    /// Dispatches an in-sequence incremental event to the book.
    ///
    /// Book-level inconsistencies are logged and swallowed; the book is
    /// self-healing on the next natural or forced resync. Only malformed
    /// messages propagate, which ends the session.
    fn apply(&mut self, message: &FeedMessage) -> Result<(), FeedError> {
        match message.kind.as_str() {
            "open" => {
                let order = message.to_order()?;
                debug!(%order, "open");
                self.book.add(order);
                self.flush_book_update(message);
            }
            "done" => {
                // No price means the order never posted (market or
                // filled-on-arrival); there is nothing to remove.
                if !message.has_price() {
                    return Ok(());
                }
                let order = message.to_order()?;
                debug!(%order, reason = message.reason.as_deref().unwrap_or(""), "done");
                self.book.remove(&order)?;
                self.flush_book_update(message);
            }
            "match" => {
                let tick = Match::from_message(message)?;
                debug!(
                    trade_id = tick.trade_id,
                    price = %tick.price,
                    size = %tick.size,
                    "match"
                );
                match self.book.match_order(&tick) {
                    Ok(()) => {
                        self.flush_book_update(message);
                        self.flush_trade_tick(&tick);
                    }
                    // A single mismatch is survivable; repeats are a strong
                    // resync signal and will show up as such in the logs.
                    Err(err) => error!(error = %err, "match not applied"),
                }
            }
            "change" => {
                if !message.has_price() {
                    return Ok(());
                }
                let change = Change::from_message(message)?;
                match self.book.change(&change) {
                    Ok(()) => self.flush_book_update(message),
                    Err(err @ BookError::SizeMismatch { .. }) => {
                        error!(error = %err, "change not applied")
                    }
                    Err(err) => warn!(error = %err, "change for unknown order"),
                }
            }
            other => debug!(kind = other, "ignoring message type"),
        }

        if self.book.is_crossed() {
            let (bids, asks) = self.book.top_n(1);
            error!(
                best_bid = ?bids.first(),
                best_ask = ?asks.first(),
                "book is crossed, mirror has diverged from the exchange"
            );
        }
        if tracing::enabled!(Level::DEBUG) {
            let (bids, asks) = self.book.top_n(5);
            debug!(?bids, ?asks, "top of book");
        }
        Ok(())
    }

    /// Discards book state and reseeds from a fresh snapshot.
    ///
    /// The clear must precede the fetch: seeding on top of stale state
    /// leaves ghost orders the new snapshot no longer contains.
    async fn resync(&mut self) -> Result<(), FeedError> {
        self.book.clear();
        self.flush_clear();
        self.sync_book().await
    }

    /// Fetches a level-3 snapshot and seeds the book from it.
    async fn sync_book(&mut self) -> Result<(), FeedError> {
        self.snapshot_throttle.acquire().await?;
        let snapshot = self
            .client
            .get_book(&self.config.product_id, SNAPSHOT_LEVEL)
            .await?;
        self.seed_snapshot(&snapshot)
    }

    /// Adopts a snapshot: sets the sequence cursor and inserts every
    /// resting order, emitting each to raw-feed listeners so archival
    /// consumers see the seed state.
    pub fn seed_snapshot(&mut self, snapshot: &BookSnapshot) -> Result<(), FeedError> {
        self.sequence = snapshot.sequence;
        for entry in &snapshot.bids {
            self.seed_order(entry, Side::Bid)?;
        }
        for entry in &snapshot.asks {
            self.seed_order(entry, Side::Ask)?;
        }
        info!(
            sequence = snapshot.sequence,
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            "book seeded from snapshot"
        );
        Ok(())
    }

    fn seed_order(&mut self, entry: &SnapshotEntry, side: Side) -> Result<(), FeedError> {
        let order = Order::new(
            entry.order_id(),
            parse_decimal(entry.size(), "size")?,
            parse_decimal(entry.price(), "price")?,
            side,
        );
        self.flush_raw(&order.snapshot_json());
        self.book.add(order);
        Ok(())
    }

    fn flush_raw(&mut self, raw: &str) {
        for listener in &mut self.raw_listeners {
            listener.message(raw);
        }
    }

    fn flush_book_update(&mut self, message: &FeedMessage) {
        for listener in &mut self.book_listeners {
            listener.book_update(message);
        }
    }

    fn flush_trade_tick(&mut self, tick: &Match) {
        for listener in &mut self.book_listeners {
            listener.trade_tick(tick);
        }
    }

    fn flush_clear(&mut self) {
        for listener in &mut self.book_listeners {
            listener.clear();
        }
    }
}

/// Exponential reconnect backoff, doubling from a configured base.
struct Backoff {
    base: Duration,
    attempts: u32,
}

impl Backoff {
    fn new(base: Duration) -> Self {
        Self { base, attempts: 0 }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self
            .base
            .saturating_mul(2u32.saturating_pow(self.attempts))
            .min(MAX_RECONNECT_DELAY);
        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    fn reset(&mut self) {
        self.attempts = 0;
    }
}
