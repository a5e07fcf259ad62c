//! Occurrence-level detection: which individual transitions violated the
//! baseline.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::patterns::{PatternSamples, TransitionKey};
use crate::analysis::stats::PatternStats;

use super::{Classification, Severity, ThresholdPolicy};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deviation {
    pub duration: f64,
    /// `duration - baseline mean`, signed.
    pub deviation: f64,
    pub classification: Classification,
    pub z_score: Option<f64>,
    /// Only set for violations.
    pub severity: Option<Severity>,
}

pub type DeviationMap = BTreeMap<TransitionKey, Vec<Deviation>>;

/// Classify every target occurrence of each pattern the baseline knows.
/// Target patterns without a baseline are left out of the result.
pub fn detect_deviations(
    baseline: &PatternStats,
    target: &PatternSamples,
    policy: &dyn ThresholdPolicy,
) -> DeviationMap {
    let mut result = DeviationMap::new();
    let mut skipped = 0usize;

    for (key, durations) in target {
        let Some(base) = baseline.get(key) else {
            skipped += 1;
            continue;
        };
        let threshold = policy.threshold(base);

        let deviations: Vec<Deviation> = durations
            .iter()
            .map(|&duration| {
                let deviation = duration - base.mean;
                let classification = Classification::of(deviation, threshold);
                let z_score = base.z_score(duration);
                Deviation {
                    duration,
                    deviation,
                    classification,
                    z_score,
                    severity: classification
                        .is_violated()
                        .then(|| Severity::from_z_score(z_score)),
                }
            })
            .collect();

        debug!(
            pattern = %key,
            threshold,
            violations = deviations.iter().filter(|d| d.classification.is_violated()).count(),
            "checked pattern occurrences"
        );
        result.insert(key.clone(), deviations);
    }

    info!(
        patterns = result.len(),
        violations = violation_count(&result),
        without_baseline = skipped,
        "occurrence deviation scan complete"
    );
    result
}

pub fn violation_count(deviations: &DeviationMap) -> usize {
    deviations
        .values()
        .flatten()
        .filter(|d| d.classification.is_violated())
        .count()
}
