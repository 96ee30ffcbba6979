//! Property normalization and corruption filtering.
//!
//! The host's object model occasionally hands back the smallest positive
//! denormal double instead of a real value when a read fails silently. It
//! never occurs as musical data, so any value carrying it is treated as
//! corrupted. [`is_corrupted`] is the only place that knows the signature.
//!
//! Two cleanup severities coexist:
//!
//! - parameter records are cleaned leniently: corrupted optional fields
//!   become `null` (see [`crate::parameters`]);
//! - [`scrub`] is the strict whole-document pass: corrupted keys are dropped
//!   entirely unless they are identity fields, which get a fallback instead.

use serde_json::{Map, Value};
use tracing::debug;

use crate::LomValue;

/// Fallback for identity fields whose value is empty, missing or corrupted.
pub const UNNAMED: &str = "unnamed";

/// Stand-in for an error marker's message when the message itself is corrupted.
pub const UNREADABLE_ERROR: &str = "unreadable error";

/// True if `value` carries the accessor's failure signature: the smallest
/// denormal `f64` of either sign, or text containing its canonical decimal form.
/// Lists are corrupted if any element is.
pub fn is_corrupted(value: &LomValue) -> bool {
    const SENTINEL_BITS: u64 = 1;
    const SENTINEL_TEXT: &str = "5e-324";

    match value {
        LomValue::Float(x) => x.abs().to_bits() == SENTINEL_BITS,
        LomValue::Text(s) => s.contains(SENTINEL_TEXT),
        LomValue::List(items) => items.iter().any(is_corrupted),
        LomValue::Null | LomValue::Bool(_) | LomValue::Int(_) => false,
    }
}

/// Unwrap single-element lists, then replace corruption with `Null`.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: LomValue) -> LomValue {
    let value = raw.unwrap_single();
    if is_corrupted(&value) {
        LomValue::Null
    } else {
        value
    }
}

/// Normalize an identity field into display text, falling back to
/// [`UNNAMED`] instead of ever producing an empty name.
pub fn name_or_fallback(raw: LomValue) -> String {
    normalize(raw).as_text().unwrap_or_else(|| UNNAMED.to_string())
}

/// Fallback for fields that must survive the strict pass. Error markers
/// keep their `error` key so they still read back as markers.
fn essential_fallback(key: &str) -> Option<&'static str> {
    match key {
        "name" | "rack_name" => Some(UNNAMED),
        "error" => Some(UNREADABLE_ERROR),
        _ => None,
    }
}

/// Identity indices are kept verbatim even if they look corrupted.
fn is_identity_index(key: &str) -> bool {
    key.ends_with("_id")
}

fn json_is_corrupted(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(|x| is_corrupted(&LomValue::Float(x))),
        Value::String(s) => is_corrupted(&LomValue::Text(s.clone())),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_object())
            .any(json_is_corrupted),
        Value::Null | Value::Bool(_) | Value::Object(_) => false,
    }
}

/// Strict recursive cleanup of an arbitrary JSON tree.
pub fn scrub(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(scrub_object(map)),
        Value::Array(items) => Value::Array(scrub_array(items)),
        other if json_is_corrupted(other) => Value::Null,
        other => other.clone(),
    }
}

fn scrub_object(map: &Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::with_capacity(map.len());

    for (key, value) in map {
        if json_is_corrupted(value) {
            if let Some(fallback) = essential_fallback(key) {
                debug!(field = %key, "corrupted essential field replaced with fallback");
                cleaned.insert(key.clone(), Value::String(fallback.to_string()));
            } else if is_identity_index(key) {
                cleaned.insert(key.clone(), value.clone());
            } else {
                debug!(field = %key, "dropped corrupted field");
            }
            continue;
        }

        let value = match value {
            Value::Object(inner) => Value::Object(scrub_object(inner)),
            Value::Array(items) => Value::Array(scrub_array(items)),
            other => other.clone(),
        };
        cleaned.insert(key.clone(), value);
    }

    cleaned
}

fn scrub_array(items: &[Value]) -> Vec<Value> {
    items
        .iter()
        .filter(|item| !json_is_corrupted(item))
        .map(scrub)
        .collect()
}
