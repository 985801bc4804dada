//! Feed wire format and typed incremental messages.
//!
//! The `full` channel carries one JSON object per event with a common
//! envelope (`type`, `sequence`, `product_id`, `time`) and type-specific
//! fields. Decoding is permissive (every type-specific field optional);
//! the typed conversions below enforce presence at the point of use.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::book::order::{parse_decimal, Order, Side};
use crate::error::FeedError;

/// A decoded feed message, one per inbound frame.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMessage {
    #[serde(rename = "type")]
    pub kind: String,

    /// Exchange-assigned event index. Absent on the `subscriptions` ack.
    #[serde(default)]
    pub sequence: i64,

    pub product_id: Option<String>,
    pub time: Option<DateTime<Utc>>,

    // open / done / change
    pub order_id: Option<String>,
    pub price: Option<String>,
    pub remaining_size: Option<String>,
    pub side: Option<String>,
    pub reason: Option<String>,

    // match
    pub trade_id: Option<i64>,
    pub maker_order_id: Option<String>,
    pub taker_order_id: Option<String>,
    pub size: Option<String>,

    // change
    pub old_size: Option<String>,
    pub new_size: Option<String>,
}

impl FeedMessage {
    /// True when the message carries a usable price. `done` and `change`
    /// events for market orders come without one and never touch the book.
    pub fn has_price(&self) -> bool {
        self.price.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Builds the resting-order view of an `open` or `done` event.
    pub fn to_order(&self) -> Result<Order, FeedError> {
        Order::from_wire(
            field(&self.order_id, "order_id")?,
            field(&self.remaining_size, "remaining_size")?,
            field(&self.price, "price")?,
            field(&self.side, "side")?,
        )
    }
}

fn field<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, FeedError> {
    value.as_deref().ok_or(FeedError::MissingField(name))
}

/// A normalized trade: a taker order consuming the resting maker.
///
/// `side` is the **maker's** side; taker direction is the opposite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub trade_id: i64,
    pub sequence: i64,
    pub maker_order_id: String,
    pub taker_order_id: String,
    pub time: Option<DateTime<Utc>>,
    pub product_id: String,
    pub size: Decimal,
    pub price: Decimal,
    pub side: Side,
}

impl Match {
    pub fn from_message(message: &FeedMessage) -> Result<Self, FeedError> {
        Ok(Self {
            trade_id: message.trade_id.unwrap_or_default(),
            sequence: message.sequence,
            maker_order_id: field(&message.maker_order_id, "maker_order_id")?.to_string(),
            taker_order_id: field(&message.taker_order_id, "taker_order_id")?.to_string(),
            time: message.time,
            product_id: message.product_id.clone().unwrap_or_default(),
            size: parse_decimal(field(&message.size, "size")?, "size")?,
            price: parse_decimal(field(&message.price, "price")?, "price")?,
            side: Side::from_wire(field(&message.side, "side")?)?,
        })
    }
}

/// A size change to a resting order, with the exchange's reported pre-state
/// for consistency checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub sequence: i64,
    pub order_id: String,
    pub product_id: String,
    pub time: Option<DateTime<Utc>>,
    pub new_size: Decimal,
    pub old_size: Decimal,
    pub price: Decimal,
    pub side: Side,
}

impl Change {
    pub fn from_message(message: &FeedMessage) -> Result<Self, FeedError> {
        Ok(Self {
            sequence: message.sequence,
            order_id: field(&message.order_id, "order_id")?.to_string(),
            product_id: message.product_id.clone().unwrap_or_default(),
            time: message.time,
            new_size: parse_decimal(field(&message.new_size, "new_size")?, "new_size")?,
            old_size: parse_decimal(field(&message.old_size, "old_size")?, "old_size")?,
            price: parse_decimal(field(&message.price, "price")?, "price")?,
            side: Side::from_wire(field(&message.side, "side")?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_open_deserialization() {
        let json = r#"{
            "type": "open",
            "time": "2014-11-07T08:19:27.028459Z",
            "product_id": "BTC-USD",
            "sequence": 10,
            "order_id": "d50ec984-77a8-460a-b958-66f114b0de9b",
            "price": "200.2",
            "remaining_size": "1.00",
            "side": "sell"
        }"#;

        let message: FeedMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.kind, "open");
        assert_eq!(message.sequence, 10);
        assert!(message.has_price());
        assert_eq!(message.remaining_size.as_deref(), Some("1.00"));
        assert_eq!(message.side.as_deref(), Some("sell"));
        assert!(message.time.is_some());
    }

    #[test]
    fn test_done_without_price() {
        let json = r#"{
            "type": "done",
            "time": "2014-11-07T08:19:27.028459Z",
            "product_id": "BTC-USD",
            "sequence": 11,
            "order_id": "d50ec984-77a8-460a-b958-66f114b0de9b",
            "reason": "filled",
            "side": "sell",
            "remaining_size": "0"
        }"#;

        let message: FeedMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.kind, "done");
        assert!(!message.has_price());
        assert_eq!(message.reason.as_deref(), Some("filled"));
    }

    #[test]
    fn test_match_conversion() {
        let json = r#"{
            "type": "match",
            "trade_id": 10,
            "sequence": 50,
            "maker_order_id": "ac928c66-ca53-498f-9c13-a110027a60e8",
            "taker_order_id": "132fb6ae-456b-4654-b4e0-d681ac05cea1",
            "time": "2014-11-07T08:19:27.028459Z",
            "product_id": "BTC-USD",
            "size": "5.23512",
            "price": "400.23",
            "side": "sell"
        }"#;

        let message: FeedMessage = serde_json::from_str(json).unwrap();
        let m = Match::from_message(&message).unwrap();
        assert_eq!(m.trade_id, 10);
        assert_eq!(m.sequence, 50);
        assert_eq!(m.size, dec("5.23512"));
        assert_eq!(m.price, dec("400.23"));
        assert_eq!(m.side, Side::Ask);
    }

    #[test]
    fn test_match_missing_field_rejected() {
        let json = r#"{"type": "match", "sequence": 50, "price": "400.23", "size": "1", "side": "buy", "taker_order_id": "t"}"#;
        let message: FeedMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Match::from_message(&message),
            Err(FeedError::MissingField("maker_order_id"))
        ));
    }

    #[test]
    fn test_change_conversion() {
        let json = r#"{
            "type": "change",
            "time": "2014-11-07T08:19:27.028459Z",
            "sequence": 80,
            "order_id": "ac928c66-ca53-498f-9c13-a110027a60e8",
            "product_id": "BTC-USD",
            "new_size": "5.23512",
            "old_size": "12.234412",
            "price": "400.23",
            "side": "sell"
        }"#;

        let message: FeedMessage = serde_json::from_str(json).unwrap();
        let change = Change::from_message(&message).unwrap();
        assert_eq!(change.new_size, dec("5.23512"));
        assert_eq!(change.old_size, dec("12.234412"));
        assert_eq!(change.side, Side::Ask);
    }

    #[test]
    fn test_subscriptions_ack_defaults_sequence() {
        let json = r#"{"type": "subscriptions", "channels": [{"name": "full", "product_ids": ["BTC-USD"]}]}"#;
        let message: FeedMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.kind, "subscriptions");
        assert_eq!(message.sequence, 0);
    }
}
