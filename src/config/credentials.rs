//! API credential management.
//!
//! Coinbase API credentials loaded from environment variables. Values are
//! wrapped so they are never exposed through Debug or Display output.

use std::fmt;

/// Secure string wrapper that masks sensitive data in logs.
///
/// Debug output shows only `SecretString(***)` and Display shows the
/// truncated form `first4...last4`.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: String) -> Self {
        SecretString(value)
    }

    /// Returns a reference to the inner string.
    ///
    /// Only use this when the value is actually needed for a request; never
    /// log or display the returned value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns a masked version of the secret for safe logging.
    pub fn masked(&self) -> String {
        let s = &self.0;
        if s.len() <= 8 {
            return "***".to_string();
        }
        format!("{}...{}", &s[..4], &s[s.len() - 4..])
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(***)")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        SecretString::new(s)
    }
}

/// Coinbase API credentials.
///
/// Only forwarded to the REST client for request signing; the WebSocket
/// `full` channel is public and never sees them.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub passphrase: SecretString,
}

impl Credentials {
    /// Loads credentials from `COINBASE_API_KEY`, `COINBASE_API_SECRET` and
    /// `COINBASE_API_PASSPHRASE`.
    ///
    /// Trims whitespace and validates non-empty. Returns `Err` with the
    /// offending variable name if any is missing or blank.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            api_key: read_env("COINBASE_API_KEY")?,
            api_secret: read_env("COINBASE_API_SECRET")?,
            passphrase: read_env("COINBASE_API_PASSPHRASE")?,
        })
    }
}

fn read_env(name: &str) -> Result<SecretString, String> {
    let value = std::env::var(name).map_err(|_| format!("{name} not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(format!("{name} is empty after trimming whitespace"));
    }
    Ok(SecretString::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_masks_value() {
        let secret = SecretString::new("abcdefghijklmnop".to_string());
        assert_eq!(format!("{secret:?}"), "SecretString(***)");
    }

    #[test]
    fn test_display_truncates_value() {
        let secret = SecretString::new("abcdefghijklmnop".to_string());
        assert_eq!(secret.to_string(), "abcd...mnop");
    }

    #[test]
    fn test_short_secret_fully_masked() {
        let secret = SecretString::new("abc".to_string());
        assert_eq!(secret.to_string(), "***");
    }

    #[test]
    fn test_expose_secret_returns_raw_value() {
        let secret = SecretString::new("value".to_string());
        assert_eq!(secret.expose_secret(), "value");
    }
}
