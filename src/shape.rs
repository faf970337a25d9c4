//! Structural classification of resource-listing response bodies. One pure
//! function replaces the client's scattered field probing: every recognized
//! layout is a named variant, tested independently of any network code.

use serde_json::Value;

/// Wrapper field names the backend has been observed to nest lists under,
/// in probing order.
pub const WRAPPER_FIELDS: &[&str] = &["videoIds", "videos", "channels", "subscriptions"];

/// Fields that mark a record as identifying a video or channel.
pub const ID_FIELDS: &[&str] = &[
    "id",
    "username",
    "ownerUsername",
    "channel",
    "targetUsername",
    "name",
];

/// Structural classification of one decoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A sequence of plain integer ids. An empty sequence classifies here:
    /// valid but empty, not unrecognized.
    IdList,
    /// A sequence of records carrying an identifying field.
    ObjectList,
    /// A record nesting an id list under `field`.
    WrappedIds { field: &'static str },
    /// A record nesting an object list under `field`.
    WrappedObjects { field: &'static str },
    /// None of the above. The resolver advances to the next candidate.
    /// Sequences of plain strings (some deployments list bare channel names)
    /// land here too: the taxonomy only admits integer ids and identified
    /// records.
    Unrecognized,
}

/// Classifies `body` against the default wrapper fields. Never fails;
/// anything unexpected is [`Shape::Unrecognized`].
pub fn classify(body: &Value) -> Shape {
    classify_with(body, WRAPPER_FIELDS)
}

/// Classification with an explicit wrapper-field probing order.
pub fn classify_with(body: &Value, wrapper_fields: &[&'static str]) -> Shape {
    match body {
        Value::Array(items) => classify_sequence(items),
        Value::Object(map) => {
            for &field in wrapper_fields {
                if let Some(Value::Array(items)) = map.get(field) {
                    match classify_sequence(items) {
                        Shape::IdList => return Shape::WrappedIds { field },
                        Shape::ObjectList => return Shape::WrappedObjects { field },
                        _ => {}
                    }
                }
            }
            Shape::Unrecognized
        }
        _ => Shape::Unrecognized,
    }
}

/// Element type is decided by the first element only.
fn classify_sequence(items: &[Value]) -> Shape {
    match items.first() {
        None => Shape::IdList,
        Some(first) if first.is_i64() || first.is_u64() => Shape::IdList,
        Some(Value::Object(record)) if ID_FIELDS.iter().any(|f| record.contains_key(*f)) => {
            Shape::ObjectList
        }
        Some(_) => Shape::Unrecognized,
    }
}
