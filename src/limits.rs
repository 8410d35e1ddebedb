use crate::error::ConfigError;
use crate::risk::RiskLimits;
use crate::types::InstrumentId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Risk limits for every configured instrument, as loaded from TOML.
///
/// ```toml
/// [instruments.BTCUSDT]
/// min_price = "10"
/// max_price = "100"
/// min_quantity = "1"
/// max_quantity = "50"
/// max_position_size = "20"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub instruments: BTreeMap<InstrumentId, RiskLimits>,
}

impl RiskConfig {
    /// Parses and checks a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RiskConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Loads a config from the given TOML file path.
    ///
    /// ## Arguments
    ///
    /// * `path`: Location of the TOML file
    ///
    /// ## Returns
    ///
    /// The checked config, or `ConfigError::Io` when the file cannot be read,
    /// `ConfigError::Parse` when it is not valid TOML for this layout and
    /// `ConfigError::InvalidLimits` when an instrument's ranges are empty
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            instruments = config.instruments.len(),
            "loaded risk limits"
        );
        Ok(config)
    }

    /// Rejects the first instrument whose limits describe an empty range.
    pub fn check(&self) -> Result<(), ConfigError> {
        for (instrument, limits) in &self.instruments {
            limits
                .check_consistency()
                .map_err(|source| ConfigError::InvalidLimits {
                    instrument: instrument.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Shared, reloadable table of per-instrument risk limits.
///
/// Readers take a copy of an instrument's limits under a brief read lock, so a
/// reload never changes the limits a validation in flight is looking at. The
/// store can be shared across threads with `Arc<LimitsStore>`.
#[derive(Debug, Default)]
pub struct LimitsStore {
    limits: RwLock<HashMap<InstrumentId, RiskLimits>>,
}

impl LimitsStore {
    /// Creates an empty store. Every check against it fails closed until limits are set.
    pub fn new() -> Self {
        LimitsStore {
            limits: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a store holding every instrument of `config`.
    pub fn from_config(config: RiskConfig) -> Self {
        LimitsStore {
            limits: RwLock::new(config.instruments.into_iter().collect()),
        }
    }

    /// Returns a copy of the limits for `instrument_id`, if configured.
    pub fn get(&self, instrument_id: &InstrumentId) -> Option<RiskLimits> {
        self.limits.read().get(instrument_id).copied()
    }

    /// Sets or replaces the limits of one instrument, returning the previous ones.
    pub fn set(&self, instrument_id: InstrumentId, limits: RiskLimits) -> Option<RiskLimits> {
        self.limits.write().insert(instrument_id, limits)
    }

    /// Drops the limits of one instrument, returning them if they were set.
    pub fn remove(&self, instrument_id: &InstrumentId) -> Option<RiskLimits> {
        self.limits.write().remove(instrument_id)
    }

    /// Swaps in a whole new config in one step.
    pub fn replace_all(&self, config: RiskConfig) {
        let fresh: HashMap<_, _> = config.instruments.into_iter().collect();
        let count = fresh.len();

        *self.limits.write() = fresh;

        tracing::info!(instruments = count, "risk limits reloaded");
    }

    /// Number of instruments with limits configured.
    pub fn len(&self) -> usize {
        self.limits.read().len()
    }

    /// Returns true when no instrument has limits configured.
    pub fn is_empty(&self) -> bool {
        self.limits.read().is_empty()
    }
}
