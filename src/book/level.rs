//! A single price level: all orders resting at one price, in arrival order.

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::book::order::Order;
use crate::error::BookError;

/// Orders resting at one price, FIFO by arrival.
///
/// The FIFO ordering is price-time priority: match events always consume
/// from the oldest resting order at the level. The aggregate `size` tracks
/// the sum of all resting order sizes and is kept in step by every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    price: Decimal,
    orders: IndexMap<String, Order>,
    size: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            orders: IndexMap::new(),
            size: Decimal::ZERO,
        }
    }

    /// Appends an order at the back of the queue.
    ///
    /// Upstream guarantees ids are unique; if one repeats anyway the entry is
    /// replaced and the aggregate adjusted by the size delta, never
    /// double-counted.
    pub fn add(&mut self, order: Order) {
        self.size += order.size;
        if let Some(previous) = self.orders.insert(order.id.clone(), order) {
            self.size -= previous.size;
        }
    }

    /// Removes an order by id.
    ///
    /// Uses `shift_remove` so the arrival order of the remaining queue is
    /// untouched.
    pub fn remove(&mut self, id: &str) -> Result<Order, BookError> {
        let order = self
            .orders
            .shift_remove(id)
            .ok_or_else(|| BookError::OrderNotFound {
                id: id.to_string(),
                price: self.price,
            })?;
        self.size -= order.size;
        Ok(order)
    }

    /// Overwrites an order's size, keeping the aggregate in step.
    pub(crate) fn set_order_size(&mut self, id: &str, new_size: Decimal) -> Result<(), BookError> {
        let order = self
            .orders
            .get_mut(id)
            .ok_or_else(|| BookError::OrderNotFound {
                id: id.to_string(),
                price: self.price,
            })?;
        let delta = new_size - order.size;
        order.size = new_size;
        self.size += delta;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.orders.contains_key(id)
    }

    /// The oldest resting order; the maker a match must name.
    pub fn first_order(&self) -> Option<&Order> {
        self.orders.values().next()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }

    /// Aggregate resting size across all orders at this price.
    pub fn size(&self) -> Decimal {
        self.size
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::order::Side;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn order(id: &str, size: &str) -> Order {
        Order::new(id, dec(size), dec("100"), Side::Bid)
    }

    #[test]
    fn test_add_tracks_aggregate() {
        let mut level = PriceLevel::new(dec("100"));
        level.add(order("a", "1"));
        level.add(order("b", "2.5"));
        assert_eq!(level.size(), dec("3.5"));
        assert_eq!(level.num_orders(), 2);
        assert!(level.has("a"));
    }

    #[test]
    fn test_fifo_order_preserved_across_removal() {
        let mut level = PriceLevel::new(dec("100"));
        level.add(order("a", "1"));
        level.add(order("b", "2"));
        level.add(order("c", "3"));
        assert_eq!(level.first_order().unwrap().id, "a");

        level.remove("a").unwrap();
        assert_eq!(level.first_order().unwrap().id, "b");
        assert_eq!(level.size(), dec("5"));

        // Removing from the middle must not reorder the tail.
        level.add(order("d", "4"));
        level.remove("c").unwrap();
        assert_eq!(level.first_order().unwrap().id, "b");
        let ids: Vec<&str> = [level.get("b"), level.get("d")]
            .into_iter()
            .flatten()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn test_remove_unknown_id_fails() {
        let mut level = PriceLevel::new(dec("100"));
        level.add(order("a", "1"));
        assert!(matches!(
            level.remove("zzz"),
            Err(BookError::OrderNotFound { .. })
        ));
        assert_eq!(level.size(), dec("1"));
    }

    #[test]
    fn test_duplicate_id_does_not_double_count() {
        let mut level = PriceLevel::new(dec("100"));
        level.add(order("a", "1"));
        level.add(order("a", "4"));
        assert_eq!(level.num_orders(), 1);
        assert_eq!(level.size(), dec("4"));
    }

    #[test]
    fn test_set_order_size_adjusts_aggregate() {
        let mut level = PriceLevel::new(dec("100"));
        level.add(order("a", "5"));
        level.add(order("b", "1"));
        level.set_order_size("a", dec("3")).unwrap();
        assert_eq!(level.get("a").unwrap().size, dec("3"));
        assert_eq!(level.size(), dec("4"));
    }
}
