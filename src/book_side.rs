use crate::types::{PriceLevel, Side};
use rust_decimal::Decimal;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Type alias for the levels of one side.
///
/// Maps each price (`Decimal`) to the total quantity resting at that price.
/// Keys are unique, so a side can never hold two levels at the same price.
pub type LevelMap = BTreeMap<Decimal, Decimal>;

/// One side of an L2 book.
///
/// Levels are stored in a `BTreeMap` in ascending key order regardless of
/// side; iteration is reversed for bids so that the first level yielded is
/// always the best one. The top level is cached so `best` is O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSide {
    side: Side,
    levels: LevelMap,
    best: Option<PriceLevel>,
}

impl BookSide {
    /// Creates an empty side.
    pub fn new(side: Side) -> Self {
        BookSide {
            side,
            levels: BTreeMap::new(),
            best: None,
        }
    }

    /// Which side of the book this is.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the cached top level, or `None` when the side is empty.
    #[inline]
    pub fn best(&self) -> Option<PriceLevel> {
        self.best
    }

    /// Returns true when `price` would rank strictly ahead of `other` on this side.
    #[inline]
    pub fn is_better(&self, price: Decimal, other: Decimal) -> bool {
        match self.side {
            Side::Bid => price > other,
            Side::Ask => price < other,
        }
    }

    /// Sets the level at `price` to `quantity`, removing it when `quantity` is zero.
    ///
    /// The operation is $O(\log{N})$ where $N$ is the number of levels on the side.
    /// Callers are expected to have rejected negative inputs already.
    pub fn set(&mut self, price: Decimal, quantity: Decimal) {
        if quantity.is_zero() {
            self.remove(price);
            return;
        }

        // Re-key so the stored price carries the scale of the latest update
        self.levels.remove(&price);
        self.levels.insert(price, quantity);

        // Only a level at or ahead of the current top can become the new top
        let touches_top = match self.best {
            None => true,
            Some(best) => best.price == price || self.is_better(price, best.price),
        };
        if touches_top {
            self.best = Some(PriceLevel::new(price, quantity));
        }
    }

    /// Removes the level at `price`, returning its quantity if it was present.
    ///
    /// Removing an absent level is a no-op.
    pub fn remove(&mut self, price: Decimal) -> Option<Decimal> {
        let removed = self.levels.remove(&price)?;

        if self.best.is_some_and(|best| best.price == price) {
            self.refresh_best();
        }

        Some(removed)
    }

    /// Replaces every level on this side. Zero-quantity entries are skipped and
    /// a repeated price keeps its last quantity.
    pub fn replace<I>(&mut self, levels: I)
    where
        I: IntoIterator<Item = PriceLevel>,
    {
        self.levels.clear();
        for level in levels {
            self.levels.remove(&level.price);
            if !level.quantity.is_zero() {
                self.levels.insert(level.price, level.quantity);
            }
        }
        self.refresh_best();
    }

    /// Removes every level.
    pub fn clear(&mut self) {
        self.levels.clear();
        self.best = None;
    }

    /// Returns the quantity at an exact price, or `None` if no level exists there.
    pub fn quantity_at(&self, price: Decimal) -> Option<Decimal> {
        self.levels.get(&price).copied()
    }

    /// Number of distinct price levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true when the side holds no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterates the levels best-first.
    pub fn iter(&self) -> Levels<'_> {
        Levels {
            inner: self.levels.iter(),
            side: self.side,
        }
    }

    /// Returns up to `n` levels from the top as an owned snapshot.
    pub fn depth(&self, n: usize) -> Vec<PriceLevel> {
        self.iter().take(n).collect()
    }

    /// Sum of quantity over the top `n` levels.
    pub fn total_quantity(&self, n: usize) -> Decimal {
        self.iter().take(n).map(|level| level.quantity).sum()
    }

    fn refresh_best(&mut self) {
        let top = match self.side {
            Side::Bid => self.levels.last_key_value(),
            Side::Ask => self.levels.first_key_value(),
        };
        self.best = top.map(|(price, quantity)| PriceLevel::new(*price, *quantity));
    }
}

/// Best-first iterator over the levels of a [`BookSide`].
#[derive(Debug, Clone)]
pub struct Levels<'a> {
    inner: btree_map::Iter<'a, Decimal, Decimal>,
    side: Side,
}

impl Iterator for Levels<'_> {
    type Item = PriceLevel;

    fn next(&mut self) -> Option<Self::Item> {
        // Bids are highest-first, which is the back of the ascending map
        let entry = match self.side {
            Side::Bid => self.inner.next_back(),
            Side::Ask => self.inner.next(),
        };
        entry.map(|(price, quantity)| PriceLevel::new(*price, *quantity))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Levels<'_> {}

impl<'a> IntoIterator for &'a BookSide {
    type Item = PriceLevel;
    type IntoIter = Levels<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
