//! Engine configuration
//!
//! Every field has a default, so a partial JSON file (or none at all) is valid.

use crate::assumptions::DEFAULT_MORTALITY_RATE_PER_1000;
use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default scalar annual net migration before scenario adjustment
pub const DEFAULT_BASELINE_NET_MIGRATION: f64 = 400_000.0;

/// Default male share of births (female share is the remainder)
pub const DEFAULT_MALE_BIRTH_SHARE: f64 = 0.49;

/// Default limit on years projected past the last observed year
pub const DEFAULT_MAX_PROJECTION_YEARS: u32 = 200;

/// Default limit on memoized projections held by a gateway
pub const DEFAULT_MAX_CACHED_PROJECTIONS: usize = 10_000;

/// Default config file name in a data directory
pub const ENGINE_CONFIG_FILE: &str = "engine_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annual net migration at 0% migration scenario
    pub baseline_net_migration: f64,

    /// Rate per 1,000 substituted for missing mortality entries
    pub default_mortality_rate: f64,

    /// Male share of births
    pub male_birth_share: f64,

    /// Override for the last observed year (otherwise the latest year in the data)
    pub last_observed_year: Option<i32>,

    /// Furthest a gateway projects past the last observed year
    pub max_projection_years: u32,

    /// Cached projections a gateway keeps before starting over
    pub max_cached_projections: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_net_migration: DEFAULT_BASELINE_NET_MIGRATION,
            default_mortality_rate: DEFAULT_MORTALITY_RATE_PER_1000,
            male_birth_share: DEFAULT_MALE_BIRTH_SHARE,
            last_observed_year: None,
            max_projection_years: DEFAULT_MAX_PROJECTION_YEARS,
            max_cached_projections: DEFAULT_MAX_CACHED_PROJECTIONS,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::from_json_str(&contents)
    }

    /// Load `engine_config.json` from a data directory, falling back to defaults
    /// when the file does not exist
    pub fn from_dir_or_default(dir: &Path) -> Result<Self, LoadError> {
        let path = dir.join(ENGINE_CONFIG_FILE);
        if path.exists() {
            Self::from_json_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Female share of births
    pub fn female_birth_share(&self) -> f64 {
        1.0 - self.male_birth_share
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if !(0.0..=1.0).contains(&self.male_birth_share) {
            return Err(LoadError::Config(format!(
                "male_birth_share must be within [0, 1], got {}",
                self.male_birth_share
            )));
        }
        if !self.default_mortality_rate.is_finite() || self.default_mortality_rate < 0.0 {
            return Err(LoadError::Config(format!(
                "default_mortality_rate must be a non-negative number, got {}",
                self.default_mortality_rate
            )));
        }
        if !self.baseline_net_migration.is_finite() {
            return Err(LoadError::Config(
                "baseline_net_migration must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
