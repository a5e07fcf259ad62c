//! Deviation detection against a baseline population.

pub mod deviation;
pub mod drift;
pub mod threshold;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use deviation::{detect_deviations, Deviation, DeviationMap};
pub use drift::{detect_drift, PatternDrift};
pub use threshold::{FixedThreshold, StdDevMultiple, ThresholdPolicy};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid threshold {value}: must be finite and non-negative")]
    InvalidThreshold { value: f64 },
    #[error("invalid standard deviation multiplier {value}: must be finite and non-negative")]
    InvalidMultiplier { value: f64 },
}

/// Whether an observation stays within the allowed threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Ok,
    Violated,
}

impl Classification {
    /// Violated only when the deviation strictly exceeds the threshold.
    pub fn of(deviation: f64, threshold: f64) -> Self {
        if deviation.abs() > threshold {
            Classification::Violated
        } else {
            Classification::Ok
        }
    }

    pub fn is_violated(self) -> bool {
        self == Classification::Violated
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Ok => write!(f, "Ok"),
            Classification::Violated => write!(f, "Violated"),
        }
    }
}

/// Severity levels for violations, graded on the z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// A missing z-score means the baseline had no spread at all, so any
    /// violation of it is critical.
    pub fn from_z_score(z_score: Option<f64>) -> Self {
        match z_score.map(f64::abs) {
            None => Severity::Critical,
            Some(z) if z > 6.0 => Severity::Critical,
            Some(z) if z > 4.5 => Severity::Warning,
            Some(_) => Severity::Info,
        }
    }
}
