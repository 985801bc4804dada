//! Coinbase Exchange REST integration: snapshot client, response types,
//! and the throttle that keeps resync storms off the snapshot endpoint.

pub mod client;
pub mod throttle;
pub mod types;

pub use client::CoinbaseClient;
pub use throttle::SnapshotThrottle;
pub use types::{BookSnapshot, SnapshotEntry};
