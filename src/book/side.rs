//! One side of the book: a price-ordered map of levels.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::book::level::PriceLevel;
use crate::book::order::{Order, Side};
use crate::error::BookError;
use crate::feed::messages::Change;

/// Aggregated view of one level, as reported to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub price: Decimal,
    pub size: Decimal,
    pub num_orders: usize,
}

/// Price-ordered levels for one side of the book.
///
/// Levels live in a `BTreeMap` keyed by price so top-of-book access and
/// best-first iteration for the top-N report stay O(log n) / O(k); both are
/// on the streaming hot path.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Inserts an order, creating its level on first arrival at the price.
    pub fn add(&mut self, order: Order) {
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .add(order);
    }

    /// Removes an order, dropping its level once empty.
    pub fn remove(&mut self, order: &Order) -> Result<Order, BookError> {
        let level = self
            .levels
            .get_mut(&order.price)
            .ok_or(BookError::LevelNotFound { price: order.price })?;
        let removed = level.remove(&order.id)?;
        if level.is_empty() {
            self.levels.remove(&order.price);
        }
        Ok(removed)
    }

    /// Applies a change message after validating the reported pre-state.
    ///
    /// The old-size check catches divergence between this mirror and the
    /// exchange: a mismatch means some earlier event was lost or misapplied.
    pub fn change(&mut self, change: &Change) -> Result<(), BookError> {
        let level = self
            .levels
            .get_mut(&change.price)
            .ok_or(BookError::LevelNotFound {
                price: change.price,
            })?;
        let order = level
            .get(&change.order_id)
            .ok_or_else(|| BookError::OrderNotFound {
                id: change.order_id.clone(),
                price: change.price,
            })?;
        if order.size != change.old_size {
            return Err(BookError::SizeMismatch {
                id: change.order_id.clone(),
                expected: change.old_size,
                actual: order.size,
            });
        }
        level.set_order_size(&change.order_id, change.new_size)
    }

    /// Overwrites one order's size in place, keeping the level aggregate in
    /// step. Used for partial-fill decrements.
    pub(crate) fn set_order_size(
        &mut self,
        price: &Decimal,
        id: &str,
        new_size: Decimal,
    ) -> Result<(), BookError> {
        let level = self
            .levels
            .get_mut(price)
            .ok_or(BookError::LevelNotFound { price: *price })?;
        level.set_order_size(id, new_size)
    }

    pub fn level(&self, price: &Decimal) -> Option<&PriceLevel> {
        self.levels.get(price)
    }

    /// Best level: maximum price for bids, minimum for asks.
    pub fn top_level(&self) -> Option<&PriceLevel> {
        match self.side {
            Side::Bid => self.levels.values().next_back(),
            Side::Ask => self.levels.values().next(),
        }
    }

    pub fn find_order(&self, id: &str, price: &Decimal) -> Option<&Order> {
        self.levels.get(price).and_then(|level| level.get(id))
    }

    /// Up to `depth` best levels, best first.
    pub fn top_levels(&self, depth: usize) -> Vec<LevelSummary> {
        let summarize = |level: &PriceLevel| LevelSummary {
            price: level.price(),
            size: level.size(),
            num_orders: level.num_orders(),
        };
        match self.side {
            Side::Bid => self.levels.values().rev().take(depth).map(summarize).collect(),
            Side::Ask => self.levels.values().take(depth).map(summarize).collect(),
        }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
