//! Coinbase REST API response types.

use serde::Deserialize;

/// One resting order row from a level-3 book snapshot: `[price, size,
/// order_id]`, prices and sizes as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotEntry(pub String, pub String, pub String);

impl SnapshotEntry {
    pub fn price(&self) -> &str {
        &self.0
    }

    pub fn size(&self) -> &str {
        &self.1
    }

    pub fn order_id(&self) -> &str {
        &self.2
    }
}

/// Response from `GET /products/<product_id>/book?level=3`.
///
/// The sequence number anchors the snapshot in the incremental stream:
/// events at or below it are already reflected in the bid/ask lists.
#[derive(Debug, Clone, Deserialize)]
pub struct BookSnapshot {
    pub sequence: i64,
    pub bids: Vec<SnapshotEntry>,
    pub asks: Vec<SnapshotEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_deserialization() {
        let json = r#"{
            "sequence": 3,
            "bids": [
                ["295.96", "4.39088265", "da863862-25f4-4868-ac41-005d11ab0a5f"]
            ],
            "asks": [
                ["295.97", "25.23542881", "8b5b247a-c255-4d64-9a4e-aecd2880978d"],
                ["295.98", "0.01000000", "da863862-25f4-4868-ac41-005d11ab0a5f"]
            ]
        }"#;

        let snapshot: BookSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.sequence, 3);
        assert_eq!(snapshot.bids.len(), 1);
        assert_eq!(snapshot.asks.len(), 2);
        assert_eq!(snapshot.bids[0].price(), "295.96");
        assert_eq!(snapshot.bids[0].size(), "4.39088265");
        assert_eq!(
            snapshot.asks[0].order_id(),
            "8b5b247a-c255-4d64-9a4e-aecd2880978d"
        );
    }
}
