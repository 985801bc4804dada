//! Runtime configuration.
//!
//! A `Config` value is built once in `main` and handed to the feed handler;
//! nothing reads configuration from global state after startup.

pub mod credentials;

pub use credentials::{Credentials, SecretString};

use std::time::Duration;

const DEFAULT_REST_URL: &str = "https://api.exchange.coinbase.com";
const DEFAULT_WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";
const DEFAULT_PRODUCT_ID: &str = "BTC-USD";
const DEFAULT_RECONNECT_SECS: u64 = 5;

/// Feed handler configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Exchange REST endpoint (snapshot fetches).
    pub rest_url: String,
    /// Exchange WebSocket feed endpoint.
    pub ws_url: String,
    /// Product whose book this process mirrors.
    pub product_id: String,
    /// Base reconnect delay; the handler backs off exponentially from here.
    pub reconnect_delay: Duration,
    /// Optional API credentials, forwarded to the REST client only.
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            reconnect_delay: Duration::from_secs(DEFAULT_RECONNECT_SECS),
            credentials: None,
        }
    }
}

impl Config {
    /// Builds a config from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `COINBASE_REST_URL`, `COINBASE_WS_URL`,
    /// `COINBASE_PRODUCT`, `COINBASE_RECONNECT_SECS`, plus the credential
    /// variables read by [`Credentials::from_env`]. Credentials are optional;
    /// public market data works without them.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rest_url: std::env::var("COINBASE_REST_URL").unwrap_or(defaults.rest_url),
            ws_url: std::env::var("COINBASE_WS_URL").unwrap_or(defaults.ws_url),
            product_id: std::env::var("COINBASE_PRODUCT").unwrap_or(defaults.product_id),
            reconnect_delay: std::env::var("COINBASE_RECONNECT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconnect_delay),
            credentials: Credentials::from_env().ok(),
        }
    }
}
