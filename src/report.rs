//! Report formatting and output.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::analysis::stats::PatternStats;
use crate::analysis::AnalysisReport;
use crate::detect::{DeviationMap, PatternDrift};

pub const DRIFT_REPORT_FILE: &str = "pattern_drift.txt";
pub const DEVIATION_REPORT_FILE: &str = "occurrence_deviations.txt";

/// One line per baseline pattern with its mean and std dev.
pub fn format_baseline(stats: &PatternStats) -> String {
    let mut out = String::new();
    for (pattern, s) in stats {
        let _ = writeln!(
            out,
            "Pattern {}: Mean = {:.4}, Std = {:.4}, Count = {}",
            pattern, s.mean, s.std_dev, s.count
        );
    }
    out
}

/// One line per pattern whose mean shifted beyond the threshold.
pub fn format_drift(drift: &[PatternDrift]) -> String {
    let mut out = String::new();
    for d in drift {
        let _ = writeln!(
            out,
            "Pattern {}: Mean_L1 = {:.4}, Mean_L2 = {:.4}",
            d.pattern, d.baseline_mean, d.target_mean
        );
    }
    out
}

/// For every pattern with at least one violation: a header with the
/// baseline statistics followed by the violating occurrences.
pub fn format_deviations(baseline: &PatternStats, deviations: &DeviationMap) -> String {
    let mut out = String::new();
    for (pattern, list) in deviations {
        let violated: Vec<_> = list
            .iter()
            .filter(|d| d.classification.is_violated())
            .collect();
        if violated.is_empty() {
            continue;
        }
        let Some(base) = baseline.get(pattern) else {
            continue;
        };

        let _ = writeln!(
            out,
            "Pattern {}: Mean_L1 = {:.4}, Std_L1 = {:.4}",
            pattern, base.mean, base.std_dev
        );
        for d in violated {
            let _ = writeln!(
                out,
                "  Duration: {:.4}, Deviation: {:.4}",
                d.duration, d.deviation
            );
        }
    }
    out
}

/// Every compared target occurrence with its classification, grouped
/// under the pattern's baseline statistics.
pub fn format_occurrences(baseline: &PatternStats, deviations: &DeviationMap) -> String {
    let mut out = String::new();
    for (pattern, list) in deviations {
        let Some(base) = baseline.get(pattern) else {
            continue;
        };
        let _ = writeln!(
            out,
            "Pattern {}: Mean_L1 = {:.4}, Std_L1 = {:.4}",
            pattern, base.mean, base.std_dev
        );
        for d in list {
            let _ = writeln!(
                out,
                "  Duration: {:.4}, Deviation: {:.4}, Status: {}",
                d.duration, d.deviation, d.classification
            );
        }
    }
    out
}

/// Human-readable console report: baseline statistics, then both detector
/// outputs. With `all_occurrences`, Ok occurrences are listed too.
pub fn format_console(report: &AnalysisReport, all_occurrences: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Transition Timing Analysis ===");
    let _ = writeln!(out, "Run:        {}", report.run_id);
    let _ = writeln!(out, "Partition:  {}", report.partition);
    let _ = writeln!(out, "Threshold:  {}", report.threshold);
    let _ = writeln!(
        out,
        "Traces:     {} baseline, {} target (min support {})",
        report.baseline_traces, report.target_traces, report.min_support
    );

    let _ = writeln!(out, "\nBaseline patterns (L1):");
    section(&mut out, format_baseline(&report.baseline_stats), "no patterns");

    let _ = writeln!(out, "\nPattern drift in L2:");
    section(&mut out, format_drift(&report.drift), "no drifted patterns");

    if all_occurrences {
        let _ = writeln!(out, "\nOccurrences in L2:");
        section(
            &mut out,
            format_occurrences(&report.baseline_stats, &report.deviations),
            "no compared occurrences",
        );
    } else {
        let _ = writeln!(out, "\nDeviations in L2:");
        section(
            &mut out,
            format_deviations(&report.baseline_stats, &report.deviations),
            "no violations",
        );
    }
    out
}

fn section(out: &mut String, body: String, empty: &str) {
    if body.is_empty() {
        let _ = writeln!(out, "  ({empty})");
    } else {
        out.push_str(&body);
    }
}

pub fn to_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize analysis report")
}

/// Write the drift and deviation reports into `dir`, creating it if needed.
pub fn write_reports(report: &AnalysisReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let files = [
        (DRIFT_REPORT_FILE, format_drift(&report.drift)),
        (
            DEVIATION_REPORT_FILE,
            format_deviations(&report.baseline_stats, &report.deviations),
        ),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, body) in files {
        let path = dir.join(name);
        std::fs::write(&path, body)
            .with_context(|| format!("failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "wrote report");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::patterns::{PatternSamples, TransitionKey};
    use crate::analysis::stats::compute_stats;
    use crate::detect::{detect_deviations, detect_drift, FixedThreshold};

    fn fixture() -> (PatternStats, DeviationMap, Vec<PatternDrift>) {
        let mut base = PatternSamples::new();
        base.insert(TransitionKey::new("A", "B"), vec![10.0, 20.0, 30.0]);
        base.insert(TransitionKey::new("B", "C"), vec![5.0]);
        let mut target = PatternSamples::new();
        target.insert(TransitionKey::new("A", "B"), vec![35.0, 50.0, 21.0]);
        target.insert(TransitionKey::new("B", "C"), vec![6.0]);

        let policy = FixedThreshold::new(10.0).unwrap();
        let base_stats = compute_stats(&base);
        let deviations = detect_deviations(&base_stats, &target, &policy);
        let drift = detect_drift(&base_stats, &compute_stats(&target), &policy);
        (base_stats, deviations, drift)
    }

    #[test]
    fn test_format_drift() {
        let (_, _, drift) = fixture();
        assert_eq!(
            format_drift(&drift),
            "Pattern (A, B): Mean_L1 = 20.0000, Mean_L2 = 35.3333\n"
        );
    }

    #[test]
    fn test_format_deviations_lists_only_violations() {
        let (base, deviations, _) = fixture();
        let text = format_deviations(&base, &deviations);
        assert!(text.starts_with("Pattern (A, B): Mean_L1 = 20.0000, Std_L1 = 8.1650\n"));
        assert!(text.contains("  Duration: 35.0000, Deviation: 15.0000\n"));
        assert!(text.contains("  Duration: 50.0000, Deviation: 30.0000\n"));
        assert!(!text.contains("21.0000"));
        // (B, C) has no violations, so no header either
        assert!(!text.contains("(B, C)"));
    }

    #[test]
    fn test_format_occurrences_lists_every_status() {
        let (base, deviations, _) = fixture();
        let text = format_occurrences(&base, &deviations);
        assert!(text.contains("  Duration: 35.0000, Deviation: 15.0000, Status: Violated\n"));
        assert!(text.contains("  Duration: 21.0000, Deviation: 1.0000, Status: Ok\n"));
        assert!(text.contains("Pattern (B, C): Mean_L1 = 5.0000, Std_L1 = 0.0000\n"));
        assert!(text.contains("  Duration: 6.0000, Deviation: 1.0000, Status: Ok\n"));
    }

    #[test]
    fn test_format_baseline_prints_every_pattern() {
        let (base, _, _) = fixture();
        let text = format_baseline(&base);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Pattern (B, C): Mean = 5.0000, Std = 0.0000, Count = 1"));
    }
}
