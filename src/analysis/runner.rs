use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::patterns::{self, PatternSamples};
use crate::analysis::stats::{compute_stats, PatternStats};
use crate::config::{AnalysisConfig, ConfigError};
use crate::detect::{detect_deviations, detect_drift, DeviationMap, PatternDrift, ThresholdPolicy};
use crate::eventlog::{EventLog, LogError};
use crate::partition::{self, PartitionPolicy};

/// Everything one analysis run produces.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub partition: String,
    pub threshold: String,
    pub min_support: usize,
    pub baseline_traces: usize,
    pub target_traces: usize,
    pub baseline_stats: PatternStats,
    pub target_stats: PatternStats,
    pub deviations: DeviationMap,
    pub drift: Vec<PatternDrift>,
}

/// The analysis pipeline:
/// 1. Split the log into baseline and target populations
/// 2. Extract transition durations from both
/// 3. Apply the support filter (and optionally keep only baseline patterns)
/// 4. Compute statistics
/// 5. Run occurrence-level and pattern-level detection
pub struct Pipeline {
    partition: Box<dyn PartitionPolicy>,
    threshold: Box<dyn ThresholdPolicy>,
    min_support: usize,
    intersect_baseline_keys: bool,
}

impl Pipeline {
    pub fn new(partition: Box<dyn PartitionPolicy>, threshold: Box<dyn ThresholdPolicy>) -> Self {
        Self {
            partition,
            threshold,
            min_support: 1,
            intersect_baseline_keys: false,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            partition::policy_from_config(&config.partition),
            config.threshold.policy()?,
        )
        .with_min_support(config.patterns.min_support)
        .with_key_intersection(config.patterns.intersect_baseline_keys))
    }

    pub fn with_min_support(mut self, min_support: usize) -> Self {
        self.min_support = min_support.max(1);
        self
    }

    pub fn with_key_intersection(mut self, enabled: bool) -> Self {
        self.intersect_baseline_keys = enabled;
        self
    }

    pub fn run(&self, log: &EventLog) -> Result<AnalysisReport, LogError> {
        info!(
            traces = log.len(),
            min_support = self.min_support,
            threshold = %self.threshold.describe(),
            "starting analysis"
        );

        let split = partition::partition(log, self.partition.as_ref())?;

        let baseline_samples = patterns::filter_support(
            &patterns::extract(split.baseline.iter().copied()),
            self.min_support,
        );
        let mut target_samples: PatternSamples = patterns::filter_support(
            &patterns::extract(split.target.iter().copied()),
            self.min_support,
        );
        if self.intersect_baseline_keys {
            target_samples = patterns::filter_to_common_keys(&baseline_samples, &target_samples);
        }
        info!(
            baseline_patterns = baseline_samples.len(),
            baseline_samples = patterns::sample_count(&baseline_samples),
            target_patterns = target_samples.len(),
            target_samples = patterns::sample_count(&target_samples),
            "extracted transition patterns"
        );

        let baseline_stats = compute_stats(&baseline_samples);
        let target_stats = compute_stats(&target_samples);

        let deviations = detect_deviations(&baseline_stats, &target_samples, self.threshold.as_ref());
        let drift = detect_drift(&baseline_stats, &target_stats, self.threshold.as_ref());

        Ok(AnalysisReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            partition: self.partition.describe(),
            threshold: self.threshold.describe(),
            min_support: self.min_support,
            baseline_traces: split.baseline.len(),
            target_traces: split.target.len(),
            baseline_stats,
            target_stats,
            deviations,
            drift,
        })
    }
}
