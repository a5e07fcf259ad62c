//! Event log model and loaders.
//!
//! A log is a set of traces, each trace an ordered sequence of events. Events
//! carry two required fields (activity name and timestamp) and an open set of
//! extra attributes. Loaders resolve the required fields through a
//! [`LogSchema`], so the rest of the crate never does untyped lookups.

pub mod json;
pub mod xes;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to read event log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XES document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XES attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed JSON event log: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing attribute `{attribute}` on {}", location(.trace, .event))]
    MissingAttribute {
        attribute: String,
        trace: usize,
        event: Option<usize>,
    },

    #[error("invalid timestamp `{value}` on trace {trace}, event {event}")]
    InvalidTimestamp {
        value: String,
        trace: usize,
        event: usize,
    },

    #[error("unsupported event log format: {} (expected .xes or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
}

fn location(trace: &usize, event: &Option<usize>) -> String {
    match event {
        Some(event) => format!("trace {trace}, event {event}"),
        None => format!("trace {trace}"),
    }
}

/// Attribute keys that carry the required event fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSchema {
    /// Event attribute holding the activity name.
    pub activity_key: String,
    /// Event attribute holding the event timestamp.
    pub timestamp_key: String,
}

impl Default for LogSchema {
    fn default() -> Self {
        Self {
            activity_key: "concept:name".to_string(),
            timestamp_key: "time:timestamp".to_string(),
        }
    }
}

/// A typed attribute value, mirroring the XES attribute kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Id(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Id(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            AttributeValue::String(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Compare against a configured value, parsed according to this
    /// attribute's type. `1.0` matches a float `1`, `TRUE` matches `true`
    /// and dates compare as instants. Unparseable values never match.
    pub fn matches(&self, expected: &str) -> bool {
        let expected = expected.trim();
        match self {
            AttributeValue::String(s) | AttributeValue::Id(s) => s == expected,
            AttributeValue::Int(v) => expected.parse::<i64>().is_ok_and(|e| e == *v),
            AttributeValue::Float(v) => expected.parse::<f64>().is_ok_and(|e| e == *v),
            AttributeValue::Boolean(v) => expected
                .to_ascii_lowercase()
                .parse::<bool>()
                .is_ok_and(|e| e == *v),
            AttributeValue::Date(d) => parse_timestamp(expected).is_some_and(|e| e == *d),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) | AttributeValue::Id(s) => f.write_str(s),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Boolean(v) => write!(f, "{v}"),
            AttributeValue::Date(d) => f.write_str(&d.to_rfc3339()),
        }
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// Parse an event timestamp. RFC 3339 with offset is preferred; values
/// without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    activity: String,
    timestamp: DateTime<Utc>,
    attributes: Attributes,
}

impl Event {
    pub fn new(activity: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            activity: activity.into(),
            timestamp,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Build an event from its raw attribute map, pulling out the activity
    /// and timestamp named by `schema`. The indices are only used for error
    /// reporting.
    pub fn from_attributes(
        mut attributes: Attributes,
        schema: &LogSchema,
        trace: usize,
        event: usize,
    ) -> Result<Self, LogError> {
        let activity = attributes
            .remove(&schema.activity_key)
            .ok_or_else(|| LogError::MissingAttribute {
                attribute: schema.activity_key.clone(),
                trace,
                event: Some(event),
            })?;
        let raw_timestamp = attributes
            .remove(&schema.timestamp_key)
            .ok_or_else(|| LogError::MissingAttribute {
                attribute: schema.timestamp_key.clone(),
                trace,
                event: Some(event),
            })?;
        let timestamp = raw_timestamp
            .as_date()
            .ok_or_else(|| LogError::InvalidTimestamp {
                value: raw_timestamp.to_string(),
                trace,
                event,
            })?;

        Ok(Self {
            activity: activity.to_string(),
            timestamp,
            attributes,
        })
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    attributes: Attributes,
    events: Vec<Event>,
}

impl Trace {
    pub fn new(attributes: Attributes, events: Vec<Event>) -> Self {
        Self { attributes, events }
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last_event(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    attributes: Attributes,
    traces: Vec<Trace>,
}

impl EventLog {
    pub fn new(attributes: Attributes, traces: Vec<Trace>) -> Self {
        Self { attributes, traces }
    }

    pub fn from_traces(traces: Vec<Trace>) -> Self {
        Self::new(Attributes::new(), traces)
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }
}

/// Load an event log, choosing the parser from the file extension.
pub fn load(path: &Path, schema: &LogSchema) -> Result<EventLog, LogError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let parse: fn(&str, &LogSchema) -> Result<EventLog, LogError> = match extension.as_deref() {
        Some("xes") => xes::parse,
        Some("json") => json::parse,
        _ => return Err(LogError::UnsupportedFormat(path.to_path_buf())),
    };

    let content = std::fs::read_to_string(path).map_err(|source| LogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let log = parse(&content, schema)?;

    info!(
        path = %path.display(),
        traces = log.len(),
        events = log.event_count(),
        "loaded event log"
    );
    Ok(log)
}
