//! Splitting a log into baseline and target populations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{PartitionConfig, PartitionKind};
use crate::eventlog::{EventLog, LogError, Trace};

/// Outcome predicate deciding which population a trace belongs to.
pub trait PartitionPolicy {
    /// Returns `true` if the trace belongs to the baseline population.
    /// `index` is the trace position in the log, used for error reporting.
    fn is_baseline(&self, index: usize, trace: &Trace) -> Result<bool, LogError>;

    /// Short description used in logs and reports.
    fn describe(&self) -> String;
}

/// Baseline = traces whose trace-level `attribute` equals `value`, with
/// `value` read according to the attribute's type.
#[derive(Debug, Clone)]
pub struct AttributeEquals {
    pub attribute: String,
    pub value: String,
}

impl PartitionPolicy for AttributeEquals {
    fn is_baseline(&self, index: usize, trace: &Trace) -> Result<bool, LogError> {
        let actual = trace
            .attribute(&self.attribute)
            .ok_or_else(|| LogError::MissingAttribute {
                attribute: self.attribute.clone(),
                trace: index,
                event: None,
            })?;
        Ok(actual.matches(&self.value))
    }

    fn describe(&self) -> String {
        format!("{} == {:?}", self.attribute, self.value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The terminal activity equals one of the markers.
    #[default]
    Exact,
    /// The terminal activity contains one of the markers as a substring.
    Contains,
}

/// Baseline = traces whose last activity matches one of `markers`.
/// Traces without events never match.
#[derive(Debug, Clone)]
pub struct TerminalActivity {
    pub markers: BTreeSet<String>,
    pub mode: MatchMode,
}

impl TerminalActivity {
    pub fn new<I, S>(markers: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            mode,
        }
    }
}

impl PartitionPolicy for TerminalActivity {
    fn is_baseline(&self, _index: usize, trace: &Trace) -> Result<bool, LogError> {
        let Some(last) = trace.last_event() else {
            return Ok(false);
        };
        let activity = last.activity();
        Ok(match self.mode {
            MatchMode::Exact => self.markers.contains(activity),
            MatchMode::Contains => self.markers.iter().any(|m| activity.contains(m.as_str())),
        })
    }

    fn describe(&self) -> String {
        let markers: Vec<&str> = self.markers.iter().map(String::as_str).collect();
        let op = match self.mode {
            MatchMode::Exact => "in",
            MatchMode::Contains => "contains any of",
        };
        format!("terminal activity {} [{}]", op, markers.join(", "))
    }
}

/// Build the partition policy selected by configuration.
pub fn policy_from_config(config: &PartitionConfig) -> Box<dyn PartitionPolicy> {
    match config.policy {
        PartitionKind::Attribute => Box::new(AttributeEquals {
            attribute: config.attribute.clone(),
            value: config.value.clone(),
        }),
        PartitionKind::TerminalActivity => Box::new(TerminalActivity::new(
            config.markers.iter().cloned(),
            config.match_mode,
        )),
    }
}

/// The two populations of a partitioned log. Traces are borrowed from the
/// source log, which is never modified.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub baseline: Vec<&'a Trace>,
    pub target: Vec<&'a Trace>,
}

impl Partition<'_> {
    pub fn len(&self) -> usize {
        self.baseline.len() + self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assign every trace of `log` to exactly one population. The first trace
/// the policy cannot evaluate aborts the split.
pub fn partition<'a>(
    log: &'a EventLog,
    policy: &dyn PartitionPolicy,
) -> Result<Partition<'a>, LogError> {
    let mut split = Partition::default();
    for (index, trace) in log.traces().iter().enumerate() {
        if policy.is_baseline(index, trace)? {
            split.baseline.push(trace);
        } else {
            split.target.push(trace);
        }
    }

    info!(
        policy = %policy.describe(),
        baseline = split.baseline.len(),
        target = split.target.len(),
        "partitioned event log"
    );
    Ok(split)
}
