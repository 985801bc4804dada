//! Downstream listener contracts and bundled implementations.
//!
//! Listeners are registered before the handler starts and are invoked
//! synchronously, in registration order, on the handler's own task. A slow
//! listener stalls feed apply; consumers that do real work should hand off
//! to their own task through a bounded channel.

use tracing::{debug, info};

use crate::feed::messages::{FeedMessage, Match};

/// Consumer of applied book events.
pub trait BookListener {
    /// Called with the parsed message after it has been applied to the book.
    fn book_update(&mut self, message: &FeedMessage);

    /// Called for every match, after `book_update`.
    fn trade_tick(&mut self, tick: &Match);

    /// Called when the book is discarded (reconnect or mid-stream resync).
    /// Mirrored state downstream is stale from this point until re-seeded.
    fn clear(&mut self);
}

/// Consumer of the verbatim upstream feed, plus the serialized form of
/// snapshot-seeded orders. The archival seam: implementations typically
/// append each line to durable storage.
pub trait RawFeedListener {
    fn message(&mut self, raw: &str);
}

/// Book listener that logs normalized trade ticks.
///
/// Registered by the binary so a bare run shows the feed is alive.
#[derive(Debug, Default)]
pub struct TradeTickLogger {
    trades_seen: u64,
}

impl BookListener for TradeTickLogger {
    fn book_update(&mut self, _message: &FeedMessage) {}

    fn trade_tick(&mut self, tick: &Match) {
        self.trades_seen += 1;
        info!(
            trade_id = tick.trade_id,
            price = %tick.price,
            size = %tick.size,
            maker_side = %tick.side,
            trades_seen = self.trades_seen,
            "trade"
        );
    }

    fn clear(&mut self) {
        info!("book cleared, trade stream restarting");
    }
}

/// Raw feed listener that logs each line at debug level. Stands in for an
/// archiver when no durable sink is configured.
#[derive(Debug, Default)]
pub struct RawFeedLogger;

impl RawFeedListener for RawFeedLogger {
    fn message(&mut self, raw: &str) {
        debug!(raw, "feed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::order::Side;
    use rust_decimal::Decimal;

    #[test]
    fn test_trade_tick_logger_counts() {
        let mut logger = TradeTickLogger::default();
        let tick = Match {
            trade_id: 7,
            sequence: 1,
            maker_order_id: "m".to_string(),
            taker_order_id: "t".to_string(),
            time: None,
            product_id: "BTC-USD".to_string(),
            size: Decimal::ONE,
            price: Decimal::ONE_HUNDRED,
            side: Side::Bid,
        };
        logger.trade_tick(&tick);
        logger.trade_tick(&tick);
        assert_eq!(logger.trades_seen, 2);
    }
}
