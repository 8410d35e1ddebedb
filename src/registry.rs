use crate::error::BookError;
use crate::order_book::OrderBook;
use crate::types::{CrossedBookWarning, Delta, InstrumentId, PriceLevel, TopOfBookChange};
use std::collections::HashMap;

/// Owns one [`OrderBook`] per subscribed instrument.
///
/// A book is created on `subscribe` and dropped whole on `unsubscribe`. The
/// registry is the single owner of every book it holds, so routing all deltas
/// for an instrument through one registry keeps that book single-writer.
///
/// This is also the layer that reports anomalies: crossed books and rejected
/// deltas are logged here, while the books themselves stay silent.
#[derive(Debug, Default)]
pub struct BookRegistry {
    books: HashMap<InstrumentId, OrderBook>,
}

impl BookRegistry {
    /// Creates a registry with no subscribed instruments.
    pub fn new() -> Self {
        BookRegistry {
            books: HashMap::new(),
        }
    }

    /// Creates an empty book for `instrument_id`.
    ///
    /// ## Returns
    ///
    /// The new book, or `BookError::AlreadySubscribed` if one already exists
    pub fn subscribe(&mut self, instrument_id: InstrumentId) -> Result<&mut OrderBook, BookError> {
        if self.books.contains_key(&instrument_id) {
            return Err(BookError::AlreadySubscribed(instrument_id));
        }

        tracing::debug!(instrument = %instrument_id, "subscribed");
        let book = OrderBook::new(instrument_id.clone());
        Ok(self.books.entry(instrument_id).or_insert(book))
    }

    /// Drops the book for `instrument_id`, handing it back to the caller.
    pub fn unsubscribe(&mut self, instrument_id: &InstrumentId) -> Option<OrderBook> {
        let removed = self.books.remove(instrument_id);
        if removed.is_some() {
            tracing::debug!(instrument = %instrument_id, "unsubscribed");
        }
        removed
    }

    /// Borrows the book of `instrument_id`, if subscribed.
    pub fn book(&self, instrument_id: &InstrumentId) -> Option<&OrderBook> {
        self.books.get(instrument_id)
    }

    /// Mutably borrows the book of `instrument_id`, if subscribed.
    pub fn book_mut(&mut self, instrument_id: &InstrumentId) -> Option<&mut OrderBook> {
        self.books.get_mut(instrument_id)
    }

    /// Applies a delta to the book of `instrument_id`.
    ///
    /// ## Arguments
    ///
    /// * `instrument_id`: The instrument whose book receives the delta
    /// * `delta`: The level change to apply
    ///
    /// ## Returns
    ///
    /// The book's change signal. Fails with `BookError::UnknownInstrument` when
    /// nothing is subscribed, or with `BookError::InvalidDelta` from the book.
    pub fn apply(
        &mut self,
        instrument_id: &InstrumentId,
        delta: Delta,
    ) -> Result<TopOfBookChange, BookError> {
        let book = self
            .books
            .get_mut(instrument_id)
            .ok_or_else(|| BookError::UnknownInstrument(instrument_id.clone()))?;

        match book.apply(delta) {
            Ok(change) => {
                if let Some(warning) = change.crossed {
                    log_crossed(instrument_id, &warning);
                }
                Ok(change)
            }
            Err(error) => {
                tracing::warn!(instrument = %instrument_id, %error, "delta rejected");
                Err(error)
            }
        }
    }

    /// Replaces the whole book of `instrument_id` with a snapshot.
    pub fn load_snapshot(
        &mut self,
        instrument_id: &InstrumentId,
        bids: &[PriceLevel],
        asks: &[PriceLevel],
    ) -> Result<Option<CrossedBookWarning>, BookError> {
        let book = self
            .books
            .get_mut(instrument_id)
            .ok_or_else(|| BookError::UnknownInstrument(instrument_id.clone()))?;

        let crossed = book.load_snapshot(bids, asks)?;
        tracing::debug!(
            instrument = %instrument_id,
            bid_levels = bids.len(),
            ask_levels = asks.len(),
            "snapshot loaded"
        );
        if let Some(warning) = &crossed {
            log_crossed(instrument_id, warning);
        }
        Ok(crossed)
    }

    /// Identifiers of every subscribed instrument, in no particular order.
    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentId> {
        self.books.keys()
    }

    /// Returns true when `instrument_id` is subscribed.
    pub fn contains(&self, instrument_id: &InstrumentId) -> bool {
        self.books.contains_key(instrument_id)
    }

    /// Number of subscribed instruments.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Returns true when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn log_crossed(instrument_id: &InstrumentId, warning: &CrossedBookWarning) {
    tracing::warn!(
        instrument = %instrument_id,
        best_bid = %warning.best_bid,
        best_ask = %warning.best_ask,
        "crossed book"
    );
}
