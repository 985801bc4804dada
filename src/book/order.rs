//! Resting orders and book sides.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;

use crate::error::FeedError;

/// Side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side; best bid is the highest price.
    Bid,
    /// Sell side; best ask is the lowest price.
    Ask,
}

impl Side {
    /// Parses the wire representation used by the feed (`"buy"` / `"sell"`).
    pub fn from_wire(value: &str) -> Result<Self, FeedError> {
        match value {
            "buy" => Ok(Side::Bid),
            "sell" => Ok(Side::Ask),
            other => Err(FeedError::InvalidSide(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resting order.
///
/// `size` is the remaining unfilled quantity and stays strictly positive
/// while the order is in the book; matches that exhaust it remove the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Server-assigned id, unique across all live orders.
    pub id: String,
    pub size: Decimal,
    pub price: Decimal,
    pub side: Side,
}

impl Order {
    pub fn new(id: impl Into<String>, size: Decimal, price: Decimal, side: Side) -> Self {
        Self {
            id: id.into(),
            size,
            price,
            side,
        }
    }

    /// Builds an order from wire-format decimal strings.
    pub fn from_wire(id: &str, size: &str, price: &str, side: &str) -> Result<Self, FeedError> {
        Ok(Self {
            id: id.to_string(),
            size: parse_decimal(size, "size")?,
            price: parse_decimal(price, "price")?,
            side: Side::from_wire(side)?,
        })
    }

    /// Serialized form pushed to raw-feed listeners when the order is seeded
    /// from a REST snapshot rather than the live stream.
    pub fn snapshot_json(&self) -> String {
        json!({
            "order_id": self.id,
            "size": self.size.to_string(),
            "price": self.price.to_string(),
            "side": self.side.as_str(),
            "type": "snapshot",
        })
        .to_string()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {} ({})",
            self.side, self.size, self.price, self.id
        )
    }
}

/// Parses a decimal string from the wire, tagging failures with the field
/// name so a contract violation is attributable in logs.
pub(crate) fn parse_decimal(value: &str, field: &'static str) -> Result<Decimal, FeedError> {
    Decimal::from_str(value).map_err(|_| FeedError::DecimalParse {
        field,
        value: value.to_string(),
    })
}
