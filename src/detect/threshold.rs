use crate::analysis::stats::PatternBaseline;

use super::DetectError;

/// How far (in seconds) an observation may stray from a pattern's baseline
/// mean before it counts as a violation.
pub trait ThresholdPolicy {
    fn threshold(&self, baseline: &PatternBaseline) -> f64;

    fn describe(&self) -> String;
}

/// The same absolute threshold for every pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedThreshold {
    seconds: f64,
}

impl FixedThreshold {
    pub fn new(seconds: f64) -> Result<Self, DetectError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DetectError::InvalidThreshold { value: seconds });
        }
        Ok(Self { seconds })
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }
}

impl ThresholdPolicy for FixedThreshold {
    fn threshold(&self, _baseline: &PatternBaseline) -> f64 {
        self.seconds
    }

    fn describe(&self) -> String {
        format!("fixed {:.4}s", self.seconds)
    }
}

/// `k` times the pattern's own baseline standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StdDevMultiple {
    k: f64,
}

impl StdDevMultiple {
    pub fn new(k: f64) -> Result<Self, DetectError> {
        if !k.is_finite() || k < 0.0 {
            return Err(DetectError::InvalidMultiplier { value: k });
        }
        Ok(Self { k })
    }

    pub fn multiplier(&self) -> f64 {
        self.k
    }
}

impl ThresholdPolicy for StdDevMultiple {
    fn threshold(&self, baseline: &PatternBaseline) -> f64 {
        self.k * baseline.std_dev
    }

    fn describe(&self) -> String {
        format!("{} x baseline std dev", self.k)
    }
}
