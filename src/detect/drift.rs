//! Pattern-level detection: which patterns shifted as a whole.

use serde::Serialize;
use tracing::info;

use crate::analysis::patterns::TransitionKey;
use crate::analysis::stats::PatternStats;

use super::ThresholdPolicy;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDrift {
    pub pattern: TransitionKey,
    pub baseline_mean: f64,
    pub baseline_std_dev: f64,
    pub target_mean: f64,
    /// `target_mean - baseline_mean`.
    pub shift: f64,
    pub threshold: f64,
}

/// Flag patterns whose target mean moved further from the baseline mean
/// than the threshold allows.
pub fn detect_drift(
    baseline: &PatternStats,
    target: &PatternStats,
    policy: &dyn ThresholdPolicy,
) -> Vec<PatternDrift> {
    let drifted: Vec<PatternDrift> = target
        .iter()
        .filter_map(|(key, t)| {
            let base = baseline.get(key)?;
            let threshold = policy.threshold(base);
            let shift = t.mean - base.mean;
            (shift.abs() > threshold).then(|| PatternDrift {
                pattern: key.clone(),
                baseline_mean: base.mean,
                baseline_std_dev: base.std_dev,
                target_mean: t.mean,
                shift,
                threshold,
            })
        })
        .collect();

    info!(
        compared = target.keys().filter(|k| baseline.contains_key(*k)).count(),
        drifted = drifted.len(),
        "pattern drift scan complete"
    );
    drifted
}
