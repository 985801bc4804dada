//! Two-sided book and top-level event dispatch.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::book::order::{Order, Side};
use crate::book::side::{BookSide, LevelSummary};
use crate::error::BookError;
use crate::feed::messages::{Change, Match};

/// The full two-sided book for one product.
///
/// Created empty, seeded from a REST snapshot, mutated by incremental feed
/// events, and cleared wholesale on resync.
#[derive(Debug, Clone)]
pub struct Book {
    product_id: String,
    bid: BookSide,
    ask: BookSide,
}

impl Book {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            bid: BookSide::new(Side::Bid),
            ask: BookSide::new(Side::Ask),
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bid,
            Side::Ask => &self.ask,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bid,
            Side::Ask => &mut self.ask,
        }
    }

    /// Unconditional insert on the order's side.
    pub fn add(&mut self, order: Order) {
        self.side_mut(order.side).add(order);
    }

    /// Removes an order on a `done` event.
    ///
    /// The full feed overlaps the REST snapshot window, so `done` events
    /// legitimately arrive for orders the snapshot never contained
    /// (filled-on-arrival, cancel-before-open). Unknown levels and unknown
    /// ids are therefore dropped at debug level rather than treated as
    /// errors.
    pub fn remove(&mut self, order: &Order) -> Result<(), BookError> {
        match self.side_mut(order.side).remove(order) {
            Ok(_) => Ok(()),
            Err(BookError::LevelNotFound { .. }) => {
                debug!(order = %order, "done for unknown level");
                Ok(())
            }
            Err(BookError::OrderNotFound { .. }) => {
                debug!(order = %order, "done for unknown order id");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Applies a match against the resting maker order.
    ///
    /// `m.side` is the maker's side. The maker must be the oldest order at
    /// its level (price-time priority); anything else is a desync signal. A
    /// fill that covers the maker's remaining size removes it, a partial
    /// fill decrements the remaining size in place.
    pub fn match_order(&mut self, m: &Match) -> Result<(), BookError> {
        let side = self.side_mut(m.side);
        let Some(level) = side.level(&m.price) else {
            // Stale matches are normal during resync windows.
            warn!(price = %m.price, maker = %m.maker_order_id, "match for unknown level");
            return Ok(());
        };
        let Some(first) = level.first_order() else {
            warn!(price = %m.price, "match against empty level");
            return Ok(());
        };
        if first.id != m.maker_order_id {
            return Err(BookError::MakerMismatch {
                expected: m.maker_order_id.clone(),
                actual: first.id.clone(),
            });
        }
        if m.size >= first.size {
            let maker = first.clone();
            side.remove(&maker)?;
        } else {
            let remaining = first.size - m.size;
            side.set_order_size(&m.price, &m.maker_order_id, remaining)?;
        }
        Ok(())
    }

    /// Applies a change message on the order's side.
    pub fn change(&mut self, change: &Change) -> Result<(), BookError> {
        self.side_mut(change.side).change(change)
    }

    pub fn find_order(&self, id: &str, price: &Decimal, side: Side) -> Option<&Order> {
        self.side(side).find_order(id, price)
    }

    /// Discards both sides. Used on resync and reconnect.
    pub fn clear(&mut self) {
        self.bid = BookSide::new(Side::Bid);
        self.ask = BookSide::new(Side::Ask);
    }

    /// Up to `depth` best levels per side: bids descending, asks ascending.
    pub fn top_n(&self, depth: usize) -> (Vec<LevelSummary>, Vec<LevelSummary>) {
        (self.bid.top_levels(depth), self.ask.top_levels(depth))
    }

    /// True when best bid >= best ask. The exchange never crosses its own
    /// book, so a crossed mirror means this replica has diverged.
    pub fn is_crossed(&self) -> bool {
        match (self.bid.top_level(), self.ask.top_level()) {
            (Some(bid), Some(ask)) => bid.price() >= ask.price(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn order(id: &str, side: Side, price: &str, size: &str) -> Order {
        Order::new(id, dec(size), dec(price), side)
    }

    fn m(maker: &str, side: Side, price: &str, size: &str) -> Match {
        Match {
            trade_id: 1,
            sequence: 0,
            maker_order_id: maker.to_string(),
            taker_order_id: "taker".to_string(),
            time: None,
            product_id: "BTC-USD".to_string(),
            size: dec(size),
            price: dec(price),
            side,
        }
    }

    fn ch(id: &str, side: Side, price: &str, old: &str, new: &str) -> Change {
        Change {
            sequence: 0,
            order_id: id.to_string(),
            product_id: "BTC-USD".to_string(),
            time: None,
            new_size: dec(new),
            old_size: dec(old),
            price: dec(price),
            side,
        }
    }

    #[test]
    fn test_single_open_creates_level() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        let level = book.side(Side::Bid).level(&dec("100")).unwrap();
        assert_eq!(level.size(), dec("1"));
        assert_eq!(level.num_orders(), 1);
        assert_eq!(level.first_order().unwrap().id, "A");
    }

    #[test]
    fn test_fifo_within_level() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        book.add(order("B", Side::Bid, "100", "2"));
        let top = book.side(Side::Bid).top_level().unwrap();
        assert_eq!(top.first_order().unwrap().id, "A");
        assert_eq!(top.size(), dec("3"));
    }

    #[test]
    fn test_full_fill_match_removes_maker() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        book.add(order("B", Side::Bid, "100", "2"));
        book.match_order(&m("A", Side::Bid, "100", "1")).unwrap();
        let top = book.side(Side::Bid).top_level().unwrap();
        assert_eq!(top.first_order().unwrap().id, "B");
        assert_eq!(top.size(), dec("2"));
    }

    #[test]
    fn test_partial_fill_decrements_maker() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Ask, "100", "5"));
        book.match_order(&m("A", Side::Ask, "100", "2")).unwrap();
        let level = book.side(Side::Ask).level(&dec("100")).unwrap();
        assert_eq!(level.get("A").unwrap().size, dec("3"));
        assert_eq!(level.size(), dec("3"));
        assert_eq!(level.num_orders(), 1);
    }

    #[test]
    fn test_match_wrong_maker_is_desync() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        book.add(order("B", Side::Bid, "100", "2"));
        let err = book.match_order(&m("B", Side::Bid, "100", "1")).unwrap_err();
        assert!(matches!(err, BookError::MakerMismatch { .. }));
        // State untouched.
        assert_eq!(book.side(Side::Bid).top_level().unwrap().size(), dec("3"));
    }

    #[test]
    fn test_match_unknown_level_is_noop() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        book.match_order(&m("A", Side::Bid, "105", "1")).unwrap();
        assert_eq!(book.side(Side::Bid).top_level().unwrap().size(), dec("1"));
    }

    #[test]
    fn test_done_removes_order_and_empties_level() {
        let mut book = Book::new("BTC-USD");
        let a = order("A", Side::Bid, "100", "1");
        book.add(a.clone());
        book.remove(&a).unwrap();
        assert!(book.side(Side::Bid).is_empty());
    }

    #[test]
    fn test_done_for_unknown_order_is_noop() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        // Unknown level.
        book.remove(&order("Z", Side::Bid, "50", "1")).unwrap();
        // Known level, unknown id.
        book.remove(&order("Z", Side::Bid, "100", "1")).unwrap();
        assert_eq!(book.side(Side::Bid).top_level().unwrap().size(), dec("1"));
    }

    #[test]
    fn test_change_roundtrip_restores_state() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "5"));
        book.change(&ch("A", Side::Bid, "100", "5", "3")).unwrap();
        book.change(&ch("A", Side::Bid, "100", "3", "5")).unwrap();
        let level = book.side(Side::Bid).level(&dec("100")).unwrap();
        assert_eq!(level.get("A").unwrap().size, dec("5"));
        assert_eq!(level.size(), dec("5"));
    }

    #[test]
    fn test_change_size_mismatch_reported() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "5"));
        book.change(&ch("A", Side::Bid, "100", "5", "3")).unwrap();
        let err = book.change(&ch("A", Side::Bid, "100", "99", "1")).unwrap_err();
        assert!(matches!(err, BookError::SizeMismatch { .. }));
        let level = book.side(Side::Bid).level(&dec("100")).unwrap();
        assert_eq!(level.get("A").unwrap().size, dec("3"));
    }

    #[test]
    fn test_add_remove_roundtrip_restores_book() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        let b = order("B", Side::Bid, "101", "2");
        book.add(b.clone());
        book.remove(&b).unwrap();
        assert_eq!(book.side(Side::Bid).num_levels(), 1);
        assert_eq!(book.side(Side::Bid).top_level().unwrap().price(), dec("100"));
    }

    #[test]
    fn test_clear_empties_both_sides() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        book.add(order("B", Side::Ask, "101", "1"));
        book.clear();
        assert!(book.side(Side::Bid).is_empty());
        assert!(book.side(Side::Ask).is_empty());
        assert_eq!(book.product_id(), "BTC-USD");
    }

    #[test]
    fn test_top_n_orders_both_sides() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "99", "1"));
        book.add(order("B", Side::Bid, "100", "2"));
        book.add(order("C", Side::Ask, "101", "3"));
        book.add(order("D", Side::Ask, "102", "4"));
        let (bids, asks) = book.top_n(5);
        assert_eq!(bids[0].price, dec("100"));
        assert_eq!(bids[1].price, dec("99"));
        assert_eq!(asks[0].price, dec("101"));
        assert_eq!(asks[1].price, dec("102"));
        assert_eq!(asks[1].num_orders, 1);
    }

    #[test]
    fn test_crossed_book_detected() {
        let mut book = Book::new("BTC-USD");
        book.add(order("A", Side::Bid, "100", "1"));
        assert!(!book.is_crossed());
        book.add(order("B", Side::Ask, "101", "1"));
        assert!(!book.is_crossed());
        book.add(order("C", Side::Ask, "99", "1"));
        assert!(book.is_crossed());
    }
}
