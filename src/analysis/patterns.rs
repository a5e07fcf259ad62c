//! Transition pattern extraction and support filtering.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::eventlog::Trace;

/// An ordered pair of consecutive activities. Matching is exact and
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionKey {
    pub from: String,
    pub to: String,
}

impl TransitionKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.from, self.to)
    }
}

// Serialized in its display form so it can key JSON objects.
impl Serialize for TransitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Durations in seconds per transition, in order of occurrence.
pub type PatternSamples = BTreeMap<TransitionKey, Vec<f64>>;

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Collect the duration of every adjacent event pair. Traces with fewer
/// than two events contribute nothing.
pub fn extract<'a, I>(traces: I) -> PatternSamples
where
    I: IntoIterator<Item = &'a Trace>,
{
    let mut samples = PatternSamples::new();
    let mut negative = 0usize;

    for trace in traces {
        for pair in trace.events().windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let duration = seconds_between(prev.timestamp(), next.timestamp());
            if duration < 0.0 {
                negative += 1;
            }
            samples
                .entry(TransitionKey::new(prev.activity(), next.activity()))
                .or_default()
                .push(duration);
        }
    }

    if negative > 0 {
        warn!(count = negative, "negative transition durations (events out of timestamp order)");
    }
    debug!(patterns = samples.len(), "extracted transition patterns");
    samples
}

/// Keep only patterns observed at least `min_support` times.
pub fn filter_support(samples: &PatternSamples, min_support: usize) -> PatternSamples {
    let kept: PatternSamples = samples
        .iter()
        .filter(|(_, durations)| durations.len() >= min_support)
        .map(|(key, durations)| (key.clone(), durations.clone()))
        .collect();
    debug!(
        min_support,
        before = samples.len(),
        after = kept.len(),
        "applied support filter"
    );
    kept
}

/// Keep only the target patterns that also exist in the baseline.
pub fn filter_to_common_keys(baseline: &PatternSamples, target: &PatternSamples) -> PatternSamples {
    target
        .iter()
        .filter(|(key, _)| baseline.contains_key(*key))
        .map(|(key, durations)| (key.clone(), durations.clone()))
        .collect()
}

/// Total number of samples across all patterns.
pub fn sample_count(samples: &PatternSamples) -> usize {
    samples.values().map(Vec::len).sum()
}
