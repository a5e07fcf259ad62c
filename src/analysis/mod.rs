//! Transition pattern extraction, statistics and the analysis pipeline.

pub mod patterns;
pub mod runner;
pub mod stats;

pub use patterns::{extract, filter_support, filter_to_common_keys, PatternSamples, TransitionKey};
pub use runner::{AnalysisReport, Pipeline};
pub use stats::{compute_stats, PatternBaseline, PatternStats};
