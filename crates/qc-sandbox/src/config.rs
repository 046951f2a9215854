//! # Sandbox Configuration
//!
//! Tunables of a simulator instance. The network configuration blob handed to
//! the executor is separate, see [`crate::domain::NetworkConfig`].
//!
//! ```ignore
//! let config = SandboxConfig::default()
//!     .with_lt_step(1_000)
//!     .with_verbosity(Verbosity::VmLogs);
//! config.validate()?;
//! ```

use crate::domain::clock::LT_STEP;
use crate::domain::entities::Verbosity;
use crate::domain::value_objects::{to_nano, Coins};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest accepted clock step. Leaves room for at least `u32::MAX`
/// deliveries before the logical clock runs out.
pub const MAX_LT_STEP: u64 = 0xFFFF_FFFF;

/// Simulator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Logical clock step between deliveries.
    pub lt_step: u64,
    /// Balance a newly created treasury is topped up to.
    pub treasury_balance: Coins,
    /// Initial global executor verbosity.
    pub verbosity: Verbosity,
    /// Fixed unix time handed to the executor.
    pub unix_time: u32,
    /// Maximum number of pending messages.
    pub max_queue_length: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            lt_step: LT_STEP,
            treasury_balance: to_nano(1_000_000),
            verbosity: Verbosity::None,
            unix_time: 1_700_000_000,
            max_queue_length: 1_000_000,
        }
    }
}

impl SandboxConfig {
    /// Parses and validates a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field holds a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lt_step == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lt_step",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.lt_step > MAX_LT_STEP {
            return Err(ConfigError::InvalidValue {
                field: "lt_step",
                reason: format!("must not exceed {MAX_LT_STEP}"),
            });
        }
        if self.max_queue_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_queue_length",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Builder-style method to set the clock step
    #[must_use]
    pub fn with_lt_step(mut self, step: u64) -> Self {
        self.lt_step = step;
        self
    }

    /// Builder-style method to set the treasury balance
    #[must_use]
    pub fn with_treasury_balance(mut self, balance: Coins) -> Self {
        self.treasury_balance = balance;
        self
    }

    /// Builder-style method to set the verbosity
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Builder-style method to set the executor unix time
    #[must_use]
    pub fn with_unix_time(mut self, unix_time: u32) -> Self {
        self.unix_time = unix_time;
        self
    }

    /// Builder-style method to bound the queue
    #[must_use]
    pub fn with_max_queue_length(mut self, max: usize) -> Self {
        self.max_queue_length = max;
        self
    }
}
