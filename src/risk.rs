//! Pre-trade risk gate.
//!
//! Every check here is a pure function of its inputs: no I/O, no interior
//! state, nothing mutated. The gate can be copied into and called from any
//! number of threads without coordination.

use crate::error::LimitsError;
use crate::limits::LimitsStore;
use crate::types::{Order, Position};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-instrument admission limits. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_quantity: Decimal,
    pub max_quantity: Decimal,
    /// Largest absolute net position allowed after the order fills
    pub max_position_size: Decimal,
}

impl RiskLimits {
    /// Creates a set of limits from its five bounds, in field order.
    pub fn new(
        min_price: Decimal,
        max_price: Decimal,
        min_quantity: Decimal,
        max_quantity: Decimal,
        max_position_size: Decimal,
    ) -> Self {
        Self {
            min_price,
            max_price,
            min_quantity,
            max_quantity,
            max_position_size,
        }
    }

    /// Checks that the limits describe non-empty ranges.
    ///
    /// ## Returns
    ///
    /// `Ok(())` when some order could pass, otherwise the first inconsistent range
    pub fn check_consistency(&self) -> Result<(), LimitsError> {
        if self.min_price > self.max_price {
            return Err(LimitsError::PriceRange {
                min: self.min_price,
                max: self.max_price,
            });
        }
        if self.min_quantity > self.max_quantity {
            return Err(LimitsError::QuantityRange {
                min: self.min_quantity,
                max: self.max_quantity,
            });
        }
        if self.max_position_size < Decimal::ZERO {
            return Err(LimitsError::NegativePositionSize(self.max_position_size));
        }
        Ok(())
    }
}

/// Why an order was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    PriceOutOfBounds,
    QuantityOutOfBounds,
    PositionLimitExceeded,
    /// No limits are configured for the order's instrument
    NoLimits,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RejectReason::PriceOutOfBounds => "price out of bounds",
            RejectReason::QuantityOutOfBounds => "quantity out of bounds",
            RejectReason::PositionLimitExceeded => "position limit exceeded",
            RejectReason::NoLimits => "no limits configured",
        };
        f.write_str(reason)
    }
}

/// Outcome of a pre-trade check. A rejection is an ordinary result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskDecision {
    Accept,
    Reject(RejectReason),
}

impl RiskDecision {
    /// Returns true when the order was admitted.
    pub fn is_accept(&self) -> bool {
        matches!(self, RiskDecision::Accept)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            RiskDecision::Accept => None,
            RiskDecision::Reject(reason) => Some(*reason),
        }
    }
}

/// Stateless pre-trade risk gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskGate;

impl RiskGate {
    /// Creates a gate. It carries no state, so one instance can be shared freely.
    pub fn new() -> Self {
        RiskGate
    }

    /// Validates one order against a position snapshot and a set of limits.
    ///
    /// Checks run in a fixed order and the first failure wins:
    ///
    /// 1. price within `[min_price, max_price]`
    /// 2. quantity within `[min_quantity, max_quantity]`
    /// 3. resulting signed position within `[-max_position_size, max_position_size]`
    ///
    /// ## Examples
    ///
    /// ```
    /// use l2_order_book::{
    ///     Decimal, Order, OrderSide, Position, RejectReason, RiskDecision, RiskGate, RiskLimits,
    /// };
    ///
    /// let limits = RiskLimits::new(
    ///     Decimal::from(10),
    ///     Decimal::from(100),
    ///     Decimal::from(1),
    ///     Decimal::from(50),
    ///     Decimal::from(20),
    /// );
    /// let position = Position::new("BTCUSDT", Decimal::from(15));
    /// let order = Order::new("BTCUSDT", OrderSide::Buy, Decimal::from(50), Decimal::from(10));
    ///
    /// assert_eq!(
    ///     RiskGate::new().validate(&order, &position, &limits),
    ///     RiskDecision::Reject(RejectReason::PositionLimitExceeded)
    /// );
    /// ```
    #[inline]
    pub fn validate(
        &self,
        order: &Order,
        position: &Position,
        limits: &RiskLimits,
    ) -> RiskDecision {
        if order.price < limits.min_price || order.price > limits.max_price {
            return RiskDecision::Reject(RejectReason::PriceOutOfBounds);
        }

        if order.quantity < limits.min_quantity || order.quantity > limits.max_quantity {
            return RiskDecision::Reject(RejectReason::QuantityOutOfBounds);
        }

        // A position too large to represent is beyond any limit
        let within_limit = position
            .signed_quantity
            .checked_add(order.signed_quantity())
            .is_some_and(|resulting| resulting.abs() <= limits.max_position_size);
        if !within_limit {
            return RiskDecision::Reject(RejectReason::PositionLimitExceeded);
        }

        RiskDecision::Accept
    }

    /// Validates each order independently against the same position snapshot.
    ///
    /// Orders earlier in the batch do not move the position seen by later
    /// ones.
    ///
    /// ## Arguments
    ///
    /// * `orders`: The orders to check, in submission order
    /// * `position`: The snapshot every order is checked against
    /// * `limits`: The limits of the orders' instrument
    ///
    /// ## Returns
    ///
    /// One `(order, decision)` pair per input order, in input order
    pub fn validate_batch(
        &self,
        orders: &[Order],
        position: &Position,
        limits: &RiskLimits,
    ) -> Vec<(Order, RiskDecision)> {
        orders
            .iter()
            .map(|order| (order.clone(), self.validate(order, position, limits)))
            .collect()
    }

    /// Validates an order against the limits currently held in `store`.
    ///
    /// Orders for an instrument with no configured limits are rejected.
    pub fn check(&self, order: &Order, position: &Position, store: &LimitsStore) -> RiskDecision {
        let decision = match store.get(&order.instrument_id) {
            Some(limits) => self.validate(order, position, &limits),
            None => RiskDecision::Reject(RejectReason::NoLimits),
        };

        if let RiskDecision::Reject(reason) = decision {
            tracing::debug!(
                instrument = %order.instrument_id,
                side = ?order.side,
                price = %order.price,
                quantity = %order.quantity,
                %reason,
                "order rejected by risk gate"
            );
        }
        decision
    }
}

/// Counts the accepted orders in a batch result.
pub fn count_accepted(results: &[(Order, RiskDecision)]) -> usize {
    results
        .iter()
        .filter(|(_, decision)| decision.is_accept())
        .count()
}
