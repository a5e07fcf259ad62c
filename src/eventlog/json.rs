//! JSON event logs.
//!
//! ```json
//! { "attributes": { "source": "export" },
//!   "traces": [
//!     { "attributes": { "rejected": "false" },
//!       "events": [ { "concept:name": "Submit", "time:timestamp": "2020-01-01T00:00:00Z" } ] } ] }
//! ```
//!
//! Events are flat attribute maps; the activity and timestamp are found
//! through the same [`LogSchema`] keys as in XES.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{AttributeValue, Attributes, Event, EventLog, LogError, LogSchema, Trace};

#[derive(Debug, Deserialize)]
struct RawLog {
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    traces: Vec<RawTrace>,
}

#[derive(Debug, Deserialize)]
struct RawTrace {
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    events: Vec<BTreeMap<String, Value>>,
}

pub fn parse(content: &str, schema: &LogSchema) -> Result<EventLog, LogError> {
    let raw: RawLog = serde_json::from_str(content)?;

    let mut traces = Vec::with_capacity(raw.traces.len());
    for (trace_idx, raw_trace) in raw.traces.into_iter().enumerate() {
        let mut events = Vec::with_capacity(raw_trace.events.len());
        for (event_idx, raw_event) in raw_trace.events.into_iter().enumerate() {
            events.push(Event::from_attributes(
                convert(raw_event),
                schema,
                trace_idx,
                event_idx,
            )?);
        }
        traces.push(Trace::new(convert(raw_trace.attributes), events));
    }

    Ok(EventLog::new(convert(raw.attributes), traces))
}

fn convert(raw: BTreeMap<String, Value>) -> Attributes {
    raw.into_iter()
        .filter_map(|(key, value)| to_attribute(value).map(|v| (key, v)))
        .collect()
}

fn to_attribute(value: Value) -> Option<AttributeValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(AttributeValue::Boolean(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(AttributeValue::Int(i)),
            None => n.as_f64().map(AttributeValue::Float),
        },
        Value::String(s) => Some(AttributeValue::String(s)),
        other => Some(AttributeValue::String(other.to_string())),
    }
}
