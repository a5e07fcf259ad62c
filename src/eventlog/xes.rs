//! XES (eXtensible Event Stream) parsing.
//!
//! Only the parts of the standard the analysis needs are interpreted:
//! typed attributes at log, trace and event level. Extensions, classifiers
//! and global default declarations are skipped, as are the children of
//! nested (list/container) attributes.

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use tracing::debug;

use super::{parse_timestamp, AttributeValue, Attributes, Event, EventLog, LogError, LogSchema, Trace};

#[derive(Default)]
struct OpenTrace {
    attributes: Attributes,
    events: Vec<Event>,
}

pub fn parse(content: &str, schema: &LogSchema) -> Result<EventLog, LogError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut log_attributes = Attributes::new();
    let mut traces: Vec<Trace> = Vec::new();
    let mut trace: Option<OpenTrace> = None;
    let mut event: Option<Attributes> = None;
    // Depth inside an element whose children are ignored.
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                match e.local_name().as_ref() {
                    b"log" => {}
                    b"trace" => trace = Some(OpenTrace::default()),
                    b"event" => event = Some(Attributes::new()),
                    tag => {
                        if let Some((key, value)) = read_attribute(tag, &e)? {
                            scope(&mut log_attributes, &mut trace, &mut event).insert(key, value);
                        }
                        skip_depth = 1;
                    }
                }
            }
            XmlEvent::Empty(e) => {
                if skip_depth > 0 {
                    continue;
                }
                match e.local_name().as_ref() {
                    b"trace" => traces.push(Trace::default()),
                    b"event" => {
                        if let Some(open) = trace.as_mut() {
                            let built = Event::from_attributes(
                                Attributes::new(),
                                schema,
                                traces.len(),
                                open.events.len(),
                            )?;
                            open.events.push(built);
                        }
                    }
                    tag => {
                        if let Some((key, value)) = read_attribute(tag, &e)? {
                            scope(&mut log_attributes, &mut trace, &mut event).insert(key, value);
                        }
                    }
                }
            }
            XmlEvent::End(e) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                match e.local_name().as_ref() {
                    b"event" => {
                        let attributes = event.take().unwrap_or_default();
                        match trace.as_mut() {
                            Some(open) => {
                                let built = Event::from_attributes(
                                    attributes,
                                    schema,
                                    traces.len(),
                                    open.events.len(),
                                )?;
                                open.events.push(built);
                            }
                            None => debug!("ignoring event outside of a trace"),
                        }
                    }
                    b"trace" => {
                        if let Some(open) = trace.take() {
                            traces.push(Trace::new(open.attributes, open.events));
                        }
                    }
                    _ => {}
                }
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    Ok(EventLog::new(log_attributes, traces))
}

/// The innermost open element that attributes attach to.
fn scope<'a>(
    log: &'a mut Attributes,
    trace: &'a mut Option<OpenTrace>,
    event: &'a mut Option<Attributes>,
) -> &'a mut Attributes {
    if let Some(event) = event.as_mut() {
        event
    } else if let Some(trace) = trace.as_mut() {
        &mut trace.attributes
    } else {
        log
    }
}

fn read_attribute(tag: &[u8], e: &BytesStart<'_>) -> Result<Option<(String, AttributeValue)>, LogError> {
    if !matches!(tag, b"string" | b"int" | b"float" | b"boolean" | b"date" | b"id") {
        return Ok(None);
    }

    let mut key = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"key" => key = Some(attr.unescape_value()?.into_owned()),
            b"value" => value = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    let (Some(key), Some(value)) = (key, value) else {
        return Ok(None);
    };

    // Values that do not parse as their declared kind are kept as strings.
    let typed = match tag {
        b"int" => {
            let parsed = value.parse::<i64>();
            match parsed {
                Ok(v) => AttributeValue::Int(v),
                Err(_) => AttributeValue::String(value),
            }
        }
        b"float" => {
            let parsed = value.parse::<f64>();
            match parsed {
                Ok(v) => AttributeValue::Float(v),
                Err(_) => AttributeValue::String(value),
            }
        }
        b"boolean" => {
            if value.eq_ignore_ascii_case("true") {
                AttributeValue::Boolean(true)
            } else if value.eq_ignore_ascii_case("false") {
                AttributeValue::Boolean(false)
            } else {
                AttributeValue::String(value)
            }
        }
        b"date" => match parse_timestamp(&value) {
            Some(ts) => AttributeValue::Date(ts),
            None => AttributeValue::String(value),
        },
        b"id" => AttributeValue::Id(value),
        _ => AttributeValue::String(value),
    };
    Ok(Some((key, typed)))
}
