//! Response decoding and interval post-processing.
//!
//! Successful responses decode into a generic [`Record`] map. One endpoint
//! quirk is handled here for every endpoint: a spurious empty-string key at
//! the top level is stripped when its value is falsy. Interval responses
//! additionally run a post-order walk over the decoded tree, normalizing
//! each object in place before the envelope is typed.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::types::{DateRange, Record, Timestamp};
use crate::Error;

/// Parses a response body as a JSON object and strips the spurious
/// empty-string key.
///
/// # Errors
/// Returns [`Error::Json`] if the body is not a JSON object.
pub fn decode_response(body: &str) -> Result<Record, Error> {
    let mut map: Record = serde_json::from_str(body)?;
    strip_spurious_key(&mut map);
    Ok(map)
}

/// Removes the empty-string key some endpoints erroneously include, but
/// only when its value is falsy; a truthy value is preserved.
pub fn strip_spurious_key(map: &mut Record) {
    if map.get("").is_some_and(is_falsy) {
        map.remove("");
    }
}

/// Python-style truthiness over JSON values: null, `false`, numeric zero,
/// and empty strings/arrays/objects are falsy.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Applies `hook` to every object node in the tree, children first, so a
/// nested object is already transformed when its parent is visited.
pub fn map_objects<F>(value: &mut Value, hook: &mut F)
where
    F: FnMut(&mut Record),
{
    match value {
        Value::Array(items) => {
            for item in items {
                map_objects(item, hook);
            }
        }
        Value::Object(map) => {
            for (_, nested) in map.iter_mut() {
                map_objects(nested, hook);
            }
            hook(map);
        }
        _ => {}
    }
}

/// The object transformation applied to interval responses:
/// `from`/`to` epoch seconds become RFC-3339 strings in `offset`, an
/// empty `comment` becomes null, and a nested `type` object is flattened
/// to a `typeGuid` field.
pub(crate) fn interval_hook(offset: UtcOffset) -> impl FnMut(&mut Record) {
    move |record: &mut Record| {
        rewrite_epoch_field(record, "from", offset);
        rewrite_epoch_field(record, "to", offset);

        if record.get("comment").and_then(Value::as_str) == Some("") {
            record.insert("comment".to_string(), Value::Null);
        }

        let type_guid = match record.get("type") {
            Some(Value::Object(type_ref)) => type_ref.get("guid").cloned(),
            _ => None,
        };
        if let Some(guid) = type_guid {
            record.remove("type");
            record.insert("typeGuid".to_string(), guid);
        }
    }
}

fn rewrite_epoch_field(record: &mut Record, key: &str, offset: UtcOffset) {
    let Some(secs) = record.get(key).and_then(Value::as_i64) else {
        return;
    };
    let Ok(dt) = OffsetDateTime::from_unix_timestamp(secs) else {
        return;
    };
    if let Ok(formatted) = dt.to_offset(offset).format(&Rfc3339) {
        record.insert(key.to_string(), Value::String(formatted));
    }
}

/// Picks the UTC offset interval datetimes are reported in, based on the
/// caller's date-range filter: the lower bound's offset wins when both
/// bounds carry different ones, a single carried offset is used as-is,
/// and UTC is the fallback when neither bound carries one.
pub(crate) fn derive_offset(range: &DateRange) -> UtcOffset {
    let lower = range.0.as_ref().and_then(Timestamp::known_offset);
    let upper = range.1.as_ref().and_then(Timestamp::known_offset);
    match (lower, upper) {
        (Some(lower), Some(upper)) => {
            if lower != upper {
                tracing::warn!(
                    %lower,
                    %upper,
                    "datetime range bounds carry different UTC offsets, using the lower bound's"
                );
            }
            lower
        }
        (Some(offset), None) | (None, Some(offset)) => offset,
        (None, None) => UtcOffset::UTC,
    }
}
