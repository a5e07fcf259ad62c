use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tracelapse::analysis::{compute_stats, extract, filter_support};
use tracelapse::config::{AnalysisConfig, LogFormat, LoggingConfig, ThresholdMode};
use tracelapse::{eventlog, partition, report};

#[derive(Parser)]
#[command(
    name = "tracelapse",
    about = "Transition-timing anomaly detection for process event logs",
    version,
    long_about = None
)]
struct Cli {
    /// Configuration file (TOML). Defaults to $TRACELAPSE_CONFIG, then ./tracelapse.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare target transitions against the baseline population
    Analyze {
        /// Event log (.xes or .json)
        log: PathBuf,

        /// Minimum observations for a pattern to be analyzed
        #[arg(long)]
        min_support: Option<usize>,

        /// Fixed deviation threshold in seconds
        #[arg(long, conflicts_with = "std_dev_multiplier")]
        threshold: Option<f64>,

        /// Threshold as a multiple of each pattern's baseline std dev
        #[arg(long)]
        std_dev_multiplier: Option<f64>,

        /// Only compare target patterns that exist in the baseline
        #[arg(long)]
        intersect_keys: bool,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,

        /// List every target occurrence with its status, not only violations
        #[arg(long)]
        all: bool,

        /// Also write the drift and deviation reports into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Show log size and how the partition policy splits it
    Summary {
        /// Event log (.xes or .json)
        log: PathBuf,
    },

    /// Print duration statistics of every pattern in the whole log
    Patterns {
        /// Event log (.xes or .json)
        log: PathBuf,

        /// Minimum observations for a pattern to be listed
        #[arg(long)]
        min_support: Option<usize>,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// The logging section lives in the config file, so config discovery runs
/// under a scoped stderr subscriber. Fallback warnings are not lost.
fn load_config(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(bootstrap, || match explicit {
        Some(path) => AnalysisConfig::load(path),
        None => Ok(AnalysisConfig::load_or_default()),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Analyze {
            log,
            min_support,
            threshold,
            std_dev_multiplier,
            intersect_keys,
            json,
            all,
            out_dir,
        } => {
            if let Some(n) = min_support {
                config.patterns.min_support = n;
            }
            if let Some(seconds) = threshold {
                config.threshold.mode = ThresholdMode::Fixed;
                config.threshold.seconds = seconds;
            }
            if let Some(k) = std_dev_multiplier {
                config.threshold.mode = ThresholdMode::StdDevMultiple;
                config.threshold.multiplier = k;
            }
            if intersect_keys {
                config.patterns.intersect_baseline_keys = true;
            }

            tracing::info!(log = %log.display(), "Running transition analysis");
            let result = tracelapse::analyze_file(&log, &config)?;

            if json {
                println!("{}", report::to_json(&result)?);
            } else {
                print!("{}", report::format_console(&result, all));
            }

            if let Some(dir) = out_dir {
                for path in report::write_reports(&result, &dir)? {
                    if !json {
                        println!("Wrote {}", path.display());
                    }
                }
            }
        }
        Commands::Summary { log } => {
            let event_log = eventlog::load(&log, &config.log)
                .with_context(|| format!("failed to load event log: {}", log.display()))?;
            let policy = partition::policy_from_config(&config.partition);
            let split = partition::partition(&event_log, policy.as_ref())?;

            let activities: BTreeSet<&str> = event_log
                .traces()
                .iter()
                .flat_map(|t| t.events())
                .map(|e| e.activity())
                .collect();
            let patterns = extract(event_log.traces());

            println!("\n=== Event Log Summary ===");
            println!("{:<20} : {}", "Traces", event_log.len());
            println!("{:<20} : {}", "Events", event_log.event_count());
            println!("{:<20} : {}", "Activities", activities.len());
            println!("{:<20} : {}", "Transition patterns", patterns.len());
            println!("{:<20} : {}", "Partition", policy.describe());
            println!("{:<20} : {}", "Baseline traces", split.baseline.len());
            println!("{:<20} : {}", "Target traces", split.target.len());
            println!();
        }
        Commands::Patterns { log, min_support } => {
            let event_log = eventlog::load(&log, &config.log)
                .with_context(|| format!("failed to load event log: {}", log.display()))?;
            let min_support = min_support.unwrap_or(config.patterns.min_support);
            let stats = compute_stats(&filter_support(&extract(event_log.traces()), min_support));

            if stats.is_empty() {
                println!("No patterns with support >= {}.", min_support);
            } else {
                print!("{}", report::format_baseline(&stats));
            }
        }
    }

    Ok(())
}
