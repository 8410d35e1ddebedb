use crate::types::{InstrumentId, Side};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by the order book engine and the book registry.
///
/// A rejected operation never leaves a book partially modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("invalid delta on {side:?} side: price {price}, quantity {quantity} (negative)")]
    InvalidDelta {
        side: Side,
        price: Decimal,
        quantity: Decimal,
    },

    #[error("no book subscribed for instrument {0}")]
    UnknownInstrument(InstrumentId),

    #[error("instrument {0} is already subscribed")]
    AlreadySubscribed(InstrumentId),
}

/// Errors raised while loading risk limits configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid limits for {instrument}: {source}")]
    InvalidLimits {
        instrument: InstrumentId,
        #[source]
        source: LimitsError,
    },
}

/// A set of risk limits that admits no order at all.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitsError {
    #[error("min_price {min} exceeds max_price {max}")]
    PriceRange { min: Decimal, max: Decimal },

    #[error("min_quantity {min} exceeds max_quantity {max}")]
    QuantityRange { min: Decimal, max: Decimal },

    #[error("max_position_size {0} is negative")]
    NegativePositionSize(Decimal),
}
