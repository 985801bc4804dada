//! In-memory level-3 order book.
//!
//! Structure mirrors ownership: each [`Order`] belongs to exactly one
//! [`PriceLevel`], each level to one [`BookSide`], each side to one
//! [`Book`]. Levels keep FIFO arrival order (price-time priority); sides
//! keep levels price-sorted for top-of-book access.

pub mod book;
pub mod level;
pub mod order;
pub mod side;

pub use book::Book;
pub use level::PriceLevel;
pub use order::{Order, Side};
pub use side::{BookSide, LevelSummary};
