use std::env;

use crate::{error::ConfigError, strategy::Strategy};

/// Environment variable holding the requested region size in bytes.
pub const REGION_BYTES_VAR: &str = "FITALLOC_REGION_BYTES";

/// Environment variable holding the strategy name, e.g. `best-fit`.
pub const STRATEGY_VAR: &str = "FITALLOC_STRATEGY";

/// Settings an allocator is initialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub region_bytes: usize,
  pub strategy: Strategy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      region_bytes: 4096,
      strategy: Strategy::default(),
    }
  }
}

impl Config {
  pub fn new(
    region_bytes: usize,
    strategy: Strategy,
  ) -> Self {
    Self { region_bytes, strategy }
  }

  /// Reads the configuration from the process environment, using the
  /// defaults for unset variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(value) = lookup(REGION_BYTES_VAR) {
      config.region_bytes = value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidRegionSize { value, source })?;
    }

    if let Some(value) = lookup(STRATEGY_VAR) {
      config.strategy = value.parse()?;
    }

    Ok(config)
  }
}
