//! Feed synchronization: wire messages, listener contracts, and the
//! handler that bridges the REST snapshot with the sequenced event stream.

pub mod handler;
pub mod listeners;
pub mod messages;

pub use handler::{FeedHandler, Outcome};
pub use listeners::{BookListener, RawFeedListener, RawFeedLogger, TradeTickLogger};
pub use messages::{Change, FeedMessage, Match};
