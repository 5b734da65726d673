//! # Pipeline Configuration
//!
//! Every tunable of the verification pipeline, loaded from YAML. All
//! sections and fields are optional; missing values take their defaults.
//!
//! ```yaml
//! stage_timeout_ms: 5000
//! market:
//!   stress_factor: 0.8
//!   comparable_seed: 42
//! fraud:
//!   threshold: 5.0
//! consensus:
//!   weights: { oracle: 0.4, market: 0.3, fraud: 0.3 }
//!   eligibility_threshold: 60
//! tokenization:
//!   token_price: 1000
//!   supply_basis: target_raise
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ptk_engines::{ConsensusConfig, FraudConfig, MarketConfig};
use ptk_registry::TokenPricing;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "PTK_PIPELINE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on each collaborator call.
    pub stage_timeout_ms: u64,
    pub market: MarketConfig,
    pub fraud: FraudConfig,
    pub consensus: ConsensusConfig,
    pub tokenization: TokenPricing,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_ms: 5_000,
            market: MarketConfig::default(),
            fraud: FraudConfig::default(),
            consensus: ConsensusConfig::default(),
            tokenization: TokenPricing::default(),
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stage_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "stage_timeout_ms must be at least 1".to_string(),
            ));
        }
        self.market.validate().map_err(ConfigError::Invalid)?;
        self.fraud.validate().map_err(ConfigError::Invalid)?;
        self.consensus.validate().map_err(ConfigError::Invalid)?;
        self.tokenization.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load from the file named by `PTK_PIPELINE_CONFIG`, or defaults when
    /// the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }
}
