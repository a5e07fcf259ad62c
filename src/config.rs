//! TOML configuration for an analysis run.
//!
//! Every section is optional; missing sections and fields fall back to the
//! defaults below, which reproduce the classic setup: partition on
//! `rejected == "false"`, minimum support of 5 and a fixed 10 second
//! threshold.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::detect::{DetectError, FixedThreshold, StdDevMultiple, ThresholdPolicy};
use crate::eventlog::LogSchema;
use crate::partition::MatchMode;

/// Environment variable naming a config file to load.
pub const CONFIG_ENV: &str = "TRACELAPSE_CONFIG";

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tracelapse.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("patterns.min_support must be at least 1")]
    ZeroSupport,
    #[error("partition.attribute must not be empty")]
    EmptyAttribute,
    #[error("partition.markers must not be empty for the terminal_activity policy")]
    NoTerminalMarkers,
    #[error(transparent)]
    Threshold(#[from] DetectError),
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub log: LogSchema,
    #[serde(default)]
    pub partition: PartitionConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub threshold: ThresholdConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AnalysisConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded analysis configuration");
        Ok(config)
    }

    /// Try, in order: the file named by `TRACELAPSE_CONFIG`, then
    /// `./tracelapse.toml`, then compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "TRACELAPSE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.patterns.min_support == 0 {
            return Err(ConfigError::ZeroSupport);
        }
        match self.partition.policy {
            PartitionKind::Attribute if self.partition.attribute.is_empty() => {
                return Err(ConfigError::EmptyAttribute);
            }
            PartitionKind::TerminalActivity if self.partition.markers.is_empty() => {
                return Err(ConfigError::NoTerminalMarkers);
            }
            _ => {}
        }
        self.threshold.policy()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    /// Match a trace-level attribute against an accepted value.
    #[default]
    Attribute,
    /// Match the last event's activity against a set of markers.
    TerminalActivity,
}

/// How traces are split. Matching traces form the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub policy: PartitionKind,
    /// Trace attribute for the `attribute` policy.
    pub attribute: String,
    /// Accepted value for the `attribute` policy.
    pub value: String,
    /// Terminal activity markers for the `terminal_activity` policy.
    pub markers: Vec<String>,
    pub match_mode: MatchMode,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            policy: PartitionKind::Attribute,
            attribute: "rejected".to_string(),
            value: "false".to_string(),
            markers: Vec::new(),
            match_mode: MatchMode::Exact,
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Minimum number of observations for a pattern to be analyzed.
    pub min_support: usize,
    /// Drop target patterns that have no counterpart in the filtered baseline.
    pub intersect_baseline_keys: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_support: 5,
            intersect_baseline_keys: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Threshold
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    #[default]
    Fixed,
    StdDevMultiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub mode: ThresholdMode,
    /// Absolute threshold in seconds (`fixed` mode).
    pub seconds: f64,
    /// Multiplier of the baseline std dev (`std_dev_multiple` mode).
    pub multiplier: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            mode: ThresholdMode::Fixed,
            seconds: 10.0,
            multiplier: 1.2,
        }
    }
}

impl ThresholdConfig {
    pub fn policy(&self) -> Result<Box<dyn ThresholdPolicy>, DetectError> {
        Ok(match self.mode {
            ThresholdMode::Fixed => Box::new(FixedThreshold::new(self.seconds)?),
            ThresholdMode::StdDevMultiple => Box::new(StdDevMultiple::new(self.multiplier)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
