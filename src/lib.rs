//! An L2 price-level order book with top-of-book change signals, paired with a
//! pure pre-trade risk gate.
//!
//! ## Architecture
//!
//! The library is made of two independent components:
//!
//! 1. `OrderBook`: per-instrument price-level state, mutated only through `Delta`s.
//!    Every applied delta returns a `TopOfBookChange` telling the caller whether
//!    the best level of the touched side moved.
//! 2. `RiskGate`: a stateless check of an `Order` against a `Position` snapshot
//!    and a set of `RiskLimits`. Rejections are ordinary values, not errors.
//!
//! Around them, `BookRegistry` owns one book per subscribed instrument and
//! `LimitsStore` holds reloadable limits that validation paths copy out.
//!
//! ## Example Usage
//!
//! ```rust
//! use l2_order_book::{
//!     BookRegistry, Decimal, Delta, InstrumentId, Order, OrderSide, Position, RiskDecision,
//!     RiskGate, RiskLimits, Side,
//! };
//!
//! let instrument = InstrumentId::new("BTCUSDT");
//! let mut registry = BookRegistry::new();
//! registry.subscribe(instrument.clone()).unwrap();
//!
//! // 1. Apply a feed delta and inspect the change signal
//! let change = registry
//!     .apply(&instrument, Delta::upsert(Side::Bid, Decimal::from(100), Decimal::from(5)))
//!     .unwrap();
//! assert!(change.changed);
//!
//! // 2. Read the top of book
//! let best_bid = registry.book(&instrument).and_then(|book| book.best(Side::Bid));
//! assert_eq!(best_bid.map(|level| level.quantity), Some(Decimal::from(5)));
//!
//! // 3. Check an order before it goes anywhere
//! let limits = RiskLimits::new(
//!     Decimal::from(10),
//!     Decimal::from(1000),
//!     Decimal::from(1),
//!     Decimal::from(50),
//!     Decimal::from(20),
//! );
//! let order = Order::new(
//!     instrument.clone(),
//!     OrderSide::Buy,
//!     Decimal::from(100),
//!     Decimal::from(5),
//! );
//! let position = Position::flat(instrument);
//! assert_eq!(RiskGate::new().validate(&order, &position, &limits), RiskDecision::Accept);
//! ```
//!
//! Applying a delta is $O(\log{N})$ in the number of levels on the touched side,
//! because each side is a `BTreeMap`; reading the best level is O(1) because the
//! top of each side is cached.

mod book_side;
mod error;
mod limits;
mod order_book;
mod registry;
mod risk;
mod types;

// Re-export public API
pub use book_side::{BookSide, LevelMap, Levels};
pub use error::{BookError, ConfigError, LimitsError};
pub use limits::{LimitsStore, RiskConfig};
pub use order_book::OrderBook;
pub use registry::BookRegistry;
pub use risk::{count_accepted, RejectReason, RiskDecision, RiskGate, RiskLimits};
pub use types::{
    CrossedBookWarning, Delta, DeltaAction, InstrumentId, Order, OrderSide, Position, PriceLevel,
    Side, TopOfBookChange,
};

// Re-export commonly used external dependencies
pub use rust_decimal::Decimal;
