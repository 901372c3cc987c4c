//! Field serializer
//!
//! Flattens one event's payload into ordered key/value strings. Metadata
//! fields (`_message`, `_category`, `_level`, `_timestamp`) and the static
//! content from the config are merged in first; static content wins over
//! same-named payload fields.
//!
//! Objects and arrays are encoded as JSON text, everything else is converted
//! to its plain string form. A field that cannot be encoded (a circular or
//! too deeply nested structure) is replaced by [`CIRCULAR_PLACEHOLDER`]; the
//! remaining fields of the event are unaffected.
//!
//! Array payloads are shipped too, keyed by element index ("0", "1", ...).

use chrono::SecondsFormat;
use sls_core::domain::event::LogEvent;
use sls_core::domain::payload::{EncodeError, Value};
use sls_core::domain::record::{BatchedRecord, Content, SerializedFields};
use thiserror::Error;
use tracing::debug;

/// Value emitted for fields that cannot be encoded
pub const CIRCULAR_PLACEHOLDER: &str = "circular object";

/// Reasons an event is dropped without being shipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Discard {
    /// The payload is a primitive (e.g. a bare message string) or null
    #[error("payload is not an object or array")]
    NonObjectPayload,
}

/// Builds the flush-ready record for an event
pub fn to_record(
    event: &LogEvent,
    static_content: &[(String, Value)],
) -> Result<BatchedRecord, Discard> {
    let contents = serialize_event(event, static_content)?;
    Ok(BatchedRecord::new(event.start_time.timestamp(), contents))
}

/// Flattens an event's payload plus metadata into key/value pairs
pub fn serialize_event(
    event: &LogEvent,
    static_content: &[(String, Value)],
) -> Result<SerializedFields, Discard> {
    let mut fields = match &event.payload {
        Value::Object(object) => object.entries(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item.clone()))
            .collect(),
        _ => return Err(Discard::NonObjectPayload),
    };
    upsert(&mut fields, "_message", Value::from(event.message.as_str()));
    upsert(&mut fields, "_category", Value::from(event.category.as_str()));
    upsert(&mut fields, "_level", Value::from(event.level.level_str.as_str()));
    // Plain RFC 3339 text, not a JSON-quoted string.
    upsert(
        &mut fields,
        "_timestamp",
        Value::from(
            event
                .start_time
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    );
    for (key, value) in static_content {
        upsert(&mut fields, key, value.clone());
    }

    Ok(fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let rendered = render_field(&value).unwrap_or_else(|e| {
                debug!("Field '{}' could not be encoded: {}", key, e);
                CIRCULAR_PLACEHOLDER.to_string()
            });
            Content::new(key, rendered)
        })
        .collect())
}

/// Renders one field value as a string
///
/// Objects and arrays become JSON text; strings are kept verbatim; numbers
/// and booleans use their display form. Null renders as an empty string,
/// though [`serialize_event`] drops null fields before rendering.
pub fn render_field(value: &Value) -> Result<String, EncodeError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) | Value::Object(_) => value.to_json_string(),
    }
}

/// Replaces `key` in place, or appends it
fn upsert(fields: &mut Vec<(String, Value)>, key: &str, value: Value) {
    match fields.iter_mut().find(|(existing, _)| existing == key) {
        Some((_, slot)) => *slot = value,
        None => fields.push((key.to_string(), value)),
    }
}
