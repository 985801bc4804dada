use rust_decimal::Decimal;
use thiserror::Error;

use crate::coinbase::throttle::ThrottleError;

/// Book-level consistency errors.
///
/// None of these abort the feed: the handler logs them and keeps streaming,
/// and the next resync heals any divergence they indicate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("no level at price {price}")]
    LevelNotFound { price: Decimal },

    #[error("order {id} not found at price {price}")]
    OrderNotFound { id: String, price: Decimal },

    #[error("change for order {id} reports old size {expected} but book has {actual}")]
    SizeMismatch {
        id: String,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("match names maker {expected} but oldest order at the level is {actual}")]
    MakerMismatch { expected: String, actual: String },
}

/// REST API errors from the snapshot client.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("rate limited by exchange: {0}")]
    RateLimit(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RestError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RestError::Connection(_) | RestError::RateLimit(_))
    }
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::Connection("request timeout".to_string())
        } else if err.is_connect() {
            RestError::Connection("failed to connect to exchange REST API".to_string())
        } else if err.is_decode() {
            RestError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                429 => RestError::RateLimit(
                    "too many requests to exchange REST API, retry later".to_string(),
                ),
                500..=599 => RestError::Connection(format!(
                    "exchange server error (HTTP {}), retry later",
                    status.as_u16()
                )),
                _ => RestError::Internal(format!("HTTP error: {status}")),
            }
        } else {
            RestError::Internal(err.to_string())
        }
    }
}

/// Errors that terminate a feed session.
///
/// Transport, decode and snapshot failures bubble out of the stream loop and
/// trigger the reconnect cycle. [`BookError`] values never convert into these
/// on the live path; the conversion exists for the `done` branch, where a
/// level-removal failure is the one book error treated as fatal.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("could not decode feed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("snapshot fetch failed: {0}")]
    Rest(#[from] RestError),

    #[error("snapshot throttle: {0}")]
    Throttled(#[from] ThrottleError),

    #[error("malformed decimal in {field}: {value:?}")]
    DecimalParse { field: &'static str, value: String },

    #[error("unsupported side {0:?}")]
    InvalidSide(String),

    #[error("feed message is missing the {0} field")]
    MissingField(&'static str),

    #[error("feed connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Book(#[from] BookError),
}
