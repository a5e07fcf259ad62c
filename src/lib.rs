//! tracelapse -- transition-timing anomaly detection for process event logs.
//!
//! The crate splits an event log into a baseline and a target population,
//! learns the duration distribution of every consecutive-activity transition
//! from the baseline, and flags target transitions (individual occurrences
//! and whole patterns) that stray beyond a configurable threshold.

pub mod analysis;
pub mod config;
pub mod detect;
pub mod eventlog;
pub mod partition;
pub mod report;

use std::path::Path;

use anyhow::{Context, Result};

use crate::analysis::{AnalysisReport, Pipeline};
use crate::config::AnalysisConfig;

/// Run the configured pipeline over an already-loaded log.
pub fn analyze(log: &eventlog::EventLog, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let pipeline = Pipeline::from_config(config).context("invalid analysis configuration")?;
    let report = pipeline.run(log).context("analysis aborted")?;
    Ok(report)
}

/// Load the log at `path` and analyze it.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisReport> {
    tracing::info!(path = %path.display(), "Loading event log");
    let log = eventlog::load(path, &config.log)
        .with_context(|| format!("failed to load event log: {}", path.display()))?;
    analyze(&log, config)
}
