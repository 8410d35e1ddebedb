use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the side of the book a price level lives on.
///
/// - `Bid` represents resting buy interest (demand side)
/// - `Ask` represents resting sell interest (supply side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side: best price is the highest
    Bid,
    /// Sell side: best price is the lowest
    Ask,
}

/// Direction of a candidate order submitted to the risk gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Signs a quantity by direction: buys add to the position, sells subtract.
    pub fn signed(self, quantity: Decimal) -> Decimal {
        match self {
            OrderSide::Buy => quantity,
            OrderSide::Sell => -quantity,
        }
    }
}

/// Identifier of a single instrument (e.g. `BTCUSDT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Creates an identifier from a venue symbol, stored as given.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Borrows the symbol.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for InstrumentId {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}

impl From<&str> for InstrumentId {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

/// A single aggregated level of the book: all resting quantity at one price.
///
/// A stored level always has a strictly positive quantity; a level whose
/// quantity drops to zero is removed from its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceLevel {
    /// The price of this level (using fixed-point arithmetic)
    pub price: Decimal,
    /// Total resting quantity at this price
    pub quantity: Decimal,
}

impl PriceLevel {
    /// Creates a level. Zero-quantity levels are never stored by a book.
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

/// What a delta does to the level at its price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaAction {
    /// Insert the level, or replace the quantity of an existing one
    Upsert,
    /// Remove the level if present
    Delete,
}

/// An incremental instruction against one side of one book.
///
/// Deltas are the only way a book is mutated level by level. The quantity of
/// a `Delete` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub action: DeltaAction,
}

impl Delta {
    /// Creates an upsert delta setting the level at `price` to `quantity`.
    pub fn upsert(side: Side, price: Decimal, quantity: Decimal) -> Self {
        Self {
            side,
            price,
            quantity,
            action: DeltaAction::Upsert,
        }
    }

    /// Creates a delete delta removing the level at `price`.
    pub fn delete(side: Side, price: Decimal) -> Self {
        Self {
            side,
            price,
            quantity: Decimal::ZERO,
            action: DeltaAction::Delete,
        }
    }
}

/// Raised alongside a successful apply when the book ends up crossed
/// (best bid >= best ask).
///
/// The update that crossed the book has already been applied; the caller
/// decides whether this is a feed error or a legitimate instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossedBookWarning {
    pub best_bid: Decimal,
    pub best_ask: Decimal,
}

impl fmt::Display for CrossedBookWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "crossed book: best bid {} >= best ask {}",
            self.best_bid, self.best_ask
        )
    }
}

/// The signal returned by every applied delta.
///
/// `changed` is true when the best price or the best quantity of `side` moved.
/// The `new_best_*` fields describe the top of `side` after the apply and are
/// `None` when the side is now empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopOfBookChange {
    pub side: Side,
    pub changed: bool,
    pub new_best_price: Option<Decimal>,
    pub new_best_quantity: Option<Decimal>,
    pub crossed: Option<CrossedBookWarning>,
}

impl TopOfBookChange {
    /// Returns the new top of the side as a level, if the side is non-empty.
    pub fn new_best(&self) -> Option<PriceLevel> {
        match (self.new_best_price, self.new_best_quantity) {
            (Some(price), Some(quantity)) => Some(PriceLevel::new(price, quantity)),
            _ => None,
        }
    }
}

/// A candidate order presented to the risk gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub instrument_id: InstrumentId,
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl Order {
    /// Creates an order.
    ///
    /// ## Arguments
    ///
    /// * `instrument_id`: The instrument the order is for
    /// * `side`: Whether the order buys or sells
    /// * `price`: Limit price (using fixed-point arithmetic)
    /// * `quantity`: Unsigned order size
    pub fn new(
        instrument_id: impl Into<InstrumentId>,
        side: OrderSide,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            side,
            price,
            quantity,
        }
    }

    /// The order's quantity signed by its direction.
    pub fn signed_quantity(&self) -> Decimal {
        self.side.signed(self.quantity)
    }
}

/// Net holding of one instrument, positive when long and negative when short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub instrument_id: InstrumentId,
    pub signed_quantity: Decimal,
}

impl Position {
    /// Creates a snapshot holding `signed_quantity` of `instrument_id`.
    pub fn new(instrument_id: impl Into<InstrumentId>, signed_quantity: Decimal) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            signed_quantity,
        }
    }

    /// A flat position in `instrument_id`.
    pub fn flat(instrument_id: impl Into<InstrumentId>) -> Self {
        Self::new(instrument_id, Decimal::ZERO)
    }

    /// Books a fill into this snapshot.
    pub fn apply_fill(&mut self, side: OrderSide, quantity: Decimal) {
        self.signed_quantity += side.signed(quantity);
    }
}
