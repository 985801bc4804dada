//! Coinbase REST client.
//!
//! Thin `reqwest` wrapper for the snapshot endpoint the feed needs, with
//! timeout configuration, user-agent headers, and optional request signing.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::debug;

use crate::coinbase::types::BookSnapshot;
use crate::config::Credentials;
use crate::error::RestError;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("coinbase-orderbook/", env!("CARGO_PKG_VERSION"));

/// Coinbase Exchange REST API client.
///
/// Public market data does not require credentials; when credentials are
/// provided every request carries the `CB-ACCESS-*` signature headers.
#[derive(Clone)]
pub struct CoinbaseClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for CoinbaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinbaseClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials.as_ref().map(|_| "***"))
            .finish()
    }
}

impl CoinbaseClient {
    /// Creates a client for public endpoints (no credentials).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::build(base_url.into(), None)
    }

    /// Creates a client that signs every request.
    pub fn with_credentials(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self::build(base_url.into(), Some(credentials))
    }

    fn build(base_url: String, credentials: Option<Credentials>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches a level-3 (per-order) book snapshot for a product.
    pub async fn get_book(&self, product_id: &str, level: u8) -> Result<BookSnapshot, RestError> {
        let request_path = format!("/products/{product_id}/book?level={level}");
        let url = format!("{}{request_path}", self.base_url);
        debug!(product_id, level, "fetching book snapshot");

        let mut request = self.client.get(&url);
        if let Some(credentials) = &self.credentials {
            let timestamp = chrono::Utc::now().timestamp().to_string();
            let signature = sign_request(credentials, &timestamp, "GET", &request_path)?;
            request = request
                .header("CB-ACCESS-KEY", credentials.api_key.expose_secret())
                .header("CB-ACCESS-SIGN", signature)
                .header("CB-ACCESS-TIMESTAMP", timestamp)
                .header(
                    "CB-ACCESS-PASSPHRASE",
                    credentials.passphrase.expose_secret(),
                );
        }

        let snapshot = request
            .send()
            .await?
            .error_for_status()?
            .json::<BookSnapshot>()
            .await?;

        debug!(
            product_id,
            sequence = snapshot.sequence,
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            "fetched book snapshot"
        );
        Ok(snapshot)
    }
}

/// Computes the `CB-ACCESS-SIGN` header: base64 HMAC-SHA256 of
/// `timestamp + method + request_path` keyed with the base64-decoded API
/// secret. The GET body is empty and contributes nothing to the prehash.
fn sign_request(
    credentials: &Credentials,
    timestamp: &str,
    method: &str,
    request_path: &str,
) -> Result<String, RestError> {
    let key = BASE64
        .decode(credentials.api_secret.expose_secret())
        .map_err(|e| RestError::InvalidRequest(format!("API secret is not valid base64: {e}")))?;

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| RestError::InvalidRequest(format!("invalid secret key: {e}")))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(request_path.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
