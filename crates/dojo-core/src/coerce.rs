//! Truthy/falsey normalisation for values coming out of string-only sources.
//!
//! Env-style files can only carry strings, so `DD_VERIFY_SSL=1` arrives as
//! `"1"`. Anything that is not one of the recognised spellings passes through
//! untouched and is validated later by whoever consumes it.
use serde_json::Value;

const TRUTHY: [&str; 3] = ["1", "true", "True"];
const FALSEY: [&str; 3] = ["0", "false", "False"];

pub fn coerce_bool(value: Value) -> Value {
    match &value {
        Value::String(s) if TRUTHY.contains(&s.as_str()) => Value::Bool(true),
        Value::String(s) if FALSEY.contains(&s.as_str()) => Value::Bool(false),
        _ => value,
    }
}
