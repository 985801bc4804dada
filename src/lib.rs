//! Real-time level-3 order book mirror for a single Coinbase product.
//!
//! Consumes the exchange's `full` channel (every order-level event) and
//! keeps an in-memory book identical to the exchange's resting state,
//! bridging the REST snapshot with the live sequenced stream and resyncing
//! whenever the stream stops being trustworthy.

pub mod book;
pub mod coinbase;
pub mod config;
pub mod error;
pub mod feed;

pub use book::{Book, BookSide, LevelSummary, Order, PriceLevel, Side};
pub use coinbase::{BookSnapshot, CoinbaseClient, SnapshotEntry};
pub use config::{Config, Credentials};
pub use error::{BookError, FeedError, RestError};
pub use feed::{BookListener, FeedHandler, FeedMessage, Match, Outcome, RawFeedListener};
