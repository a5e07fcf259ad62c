use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::patterns::{PatternSamples, TransitionKey};

/// Duration statistics of one transition pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternBaseline {
    pub mean: f64,
    /// Population standard deviation (divisor = count).
    pub std_dev: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub durations: Vec<f64>,
}

impl PatternBaseline {
    /// Summarize a set of durations. Returns `None` for an empty set, which
    /// has no defined mean.
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }

        // Sum in sorted order so the result does not depend on input order.
        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted
            .iter()
            .map(|&x| (x - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            count,
            min: sorted[0],
            max: sorted[count - 1],
            durations: durations.to_vec(),
        })
    }

    /// Z = (value - mean) / std_dev. `None` when the baseline has no spread.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.std_dev > 0.0 {
            Some((value - self.mean) / self.std_dev)
        } else {
            None
        }
    }
}

pub type PatternStats = BTreeMap<TransitionKey, PatternBaseline>;

pub fn compute_stats(samples: &PatternSamples) -> PatternStats {
    let stats: PatternStats = samples
        .iter()
        .filter_map(|(key, durations)| {
            PatternBaseline::from_durations(durations).map(|b| (key.clone(), b))
        })
        .collect();
    debug!(patterns = stats.len(), "computed pattern statistics");
    stats
}
