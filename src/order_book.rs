use crate::book_side::BookSide;
use crate::error::BookError;
use crate::types::{
    CrossedBookWarning, Delta, DeltaAction, InstrumentId, PriceLevel, Side, TopOfBookChange,
};
use rust_decimal::Decimal;

/// The L2 order book of a single instrument.
///
/// This structure is responsible only for:
///
/// - Storing the aggregated quantity at each price level
/// - Maintaining price priority (best bid/ask) on both sides
/// - Reporting, per applied delta, whether the top of the touched side moved
///
/// It never invokes callbacks; what to do with a change signal is up to the
/// caller.
///
/// ### Thread Safety
///
/// A book has no internal locking. It is meant to be owned by the single
/// worker that receives all deltas for its instrument, in feed order.
#[derive(Debug, Clone)]
pub struct OrderBook {
    instrument_id: InstrumentId,
    /// Bid side: best level is the highest price
    bids: BookSide,
    /// Ask side: best level is the lowest price
    asks: BookSide,
    /// Number of deltas and snapshots accepted so far
    update_id: u64,
}

impl OrderBook {
    /// Creates a new empty order book for `instrument_id`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use l2_order_book::{OrderBook, Side};
    ///
    /// let order_book = OrderBook::new("BTCUSDT");
    /// assert!(order_book.best(Side::Bid).is_none());
    /// ```
    pub fn new(instrument_id: impl Into<InstrumentId>) -> Self {
        OrderBook {
            instrument_id: instrument_id.into(),
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            update_id: 0,
        }
    }

    /// The instrument this book belongs to.
    pub fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Number of deltas and snapshots this book has accepted.
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    /// Applies one delta to the book and reports the effect on the top of the
    /// touched side.
    ///
    /// - `Upsert` inserts or replaces the level at `price`; a quantity of zero
    ///   removes the level, exactly like a `Delete`
    /// - `Delete` removes the level at `price`, and is a no-op if it is absent
    ///
    /// The operation is $O(\log{N})$ where $N$ is the number of price levels
    /// on the touched side.
    ///
    /// A negative price, or a negative quantity on an upsert, is rejected with
    /// [`BookError::InvalidDelta`] and the book is left untouched. A delta that
    /// leaves the book crossed is still applied; the returned change carries a
    /// [`CrossedBookWarning`].
    ///
    /// ## Arguments
    ///
    /// * `delta`: The level change to apply
    ///
    /// ## Returns
    ///
    /// A `TopOfBookChange` describing the touched side after the update
    ///
    /// ## Examples
    ///
    /// ```
    /// use l2_order_book::{Delta, Decimal, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new("BTCUSDT");
    ///
    /// let change = order_book
    ///     .apply(Delta::upsert(Side::Bid, Decimal::new(10000, 2), Decimal::from(5)))
    ///     .unwrap();
    /// assert!(change.changed);
    /// assert_eq!(change.new_best_price, Some(Decimal::from(100)));
    ///
    /// let change = order_book
    ///     .apply(Delta::upsert(Side::Bid, Decimal::from(99), Decimal::from(3)))
    ///     .unwrap();
    /// assert!(!change.changed);
    /// ```
    pub fn apply(&mut self, delta: Delta) -> Result<TopOfBookChange, BookError> {
        Self::check_delta(&delta)?;

        let book_side = self.side_mut(delta.side);
        let previous_best = book_side.best();

        match delta.action {
            DeltaAction::Upsert => book_side.set(delta.price, delta.quantity),
            DeltaAction::Delete => {
                book_side.remove(delta.price);
            }
        }

        let new_best = book_side.best();
        self.update_id += 1;

        Ok(TopOfBookChange {
            side: delta.side,
            changed: previous_best != new_best,
            new_best_price: new_best.map(|level| level.price),
            new_best_quantity: new_best.map(|level| level.quantity),
            crossed: self.crossed(),
        })
    }

    /// Applies deltas in order, stopping at the first invalid one.
    ///
    /// Deltas before the failing one stay applied; the failing delta and the
    /// rest are not. On success, one change signal per delta is returned.
    pub fn apply_all<I>(&mut self, deltas: I) -> Result<Vec<TopOfBookChange>, BookError>
    where
        I: IntoIterator<Item = Delta>,
    {
        deltas.into_iter().map(|delta| self.apply(delta)).collect()
    }

    /// Replaces both sides of the book with a full snapshot.
    ///
    /// Every level is checked before anything is replaced, so a snapshot with
    /// a negative price or quantity leaves the current book intact.
    pub fn load_snapshot(
        &mut self,
        bids: &[PriceLevel],
        asks: &[PriceLevel],
    ) -> Result<Option<CrossedBookWarning>, BookError> {
        for (side, levels) in [(Side::Bid, bids), (Side::Ask, asks)] {
            for level in levels {
                Self::check_delta(&Delta::upsert(side, level.price, level.quantity))?;
            }
        }

        self.bids.replace(bids.iter().copied());
        self.asks.replace(asks.iter().copied());
        self.update_id += 1;

        Ok(self.crossed())
    }

    /// Returns the best level of `side`, or `None` if that side is empty. O(1).
    ///
    /// ## Examples
    ///
    /// ```
    /// use l2_order_book::{Delta, Decimal, OrderBook, PriceLevel, Side};
    ///
    /// let mut order_book = OrderBook::new("BTCUSDT");
    /// order_book
    ///     .apply(Delta::upsert(Side::Ask, Decimal::new(10050, 2), Decimal::from(7)))
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     order_book.best(Side::Ask),
    ///     Some(PriceLevel::new(Decimal::new(10050, 2), Decimal::from(7)))
    /// );
    /// assert_eq!(order_book.best(Side::Bid), None);
    /// ```
    #[inline]
    pub fn best(&self, side: Side) -> Option<PriceLevel> {
        self.side(side).best()
    }

    /// Returns up to `n` levels of `side`, best first.
    ///
    /// ## Arguments
    ///
    /// * `side`: The side to read
    /// * `n`: Maximum number of levels to return
    ///
    /// ## Returns
    ///
    /// An owned snapshot taken at call time, not a live view. It is shorter
    /// than `n` when the side has fewer levels.
    pub fn depth(&self, side: Side, n: usize) -> Vec<PriceLevel> {
        self.side(side).depth(n)
    }

    /// Borrows one side of the book.
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Best ask minus best bid, when both sides are non-empty.
    ///
    /// Negative or zero when the book is crossed.
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best(Side::Ask)?.price - self.best(Side::Bid)?.price)
    }

    /// Midpoint between best bid and best ask, when both sides are non-empty.
    ///
    /// Computed from the half-spread so prices near `Decimal::MAX` do not overflow.
    pub fn mid_price(&self) -> Option<Decimal> {
        let best_bid = self.best(Side::Bid)?.price;
        let best_ask = self.best(Side::Ask)?.price;
        Some(best_bid + (best_ask - best_bid) / Decimal::TWO)
    }

    /// Returns true when best bid >= best ask.
    pub fn is_crossed(&self) -> bool {
        self.crossed().is_some()
    }

    /// Number of distinct price levels on `side`.
    pub fn level_count(&self, side: Side) -> usize {
        self.side(side).len()
    }

    /// Quantity resting at an exact price on `side`, or `None` if no level exists.
    pub fn quantity_at(&self, side: Side, price: Decimal) -> Option<Decimal> {
        self.side(side).quantity_at(price)
    }

    /// Empties both sides. The update counter keeps running.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    fn crossed(&self) -> Option<CrossedBookWarning> {
        let best_bid = self.bids.best()?.price;
        let best_ask = self.asks.best()?.price;

        (best_bid >= best_ask).then_some(CrossedBookWarning { best_bid, best_ask })
    }

    fn check_delta(delta: &Delta) -> Result<(), BookError> {
        // Delete quantities are ignored, so only the price matters for them
        let bad_quantity = delta.action == DeltaAction::Upsert && delta.quantity < Decimal::ZERO;
        let bad_price = delta.price < Decimal::ZERO;

        if bad_price || bad_quantity {
            return Err(BookError::InvalidDelta {
                side: delta.side,
                price: delta.price,
                quantity: delta.quantity,
            });
        }
        Ok(())
    }
}
