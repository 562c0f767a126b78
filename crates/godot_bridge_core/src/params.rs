//! Parameter bag normalization.
//!
//! Tool clients send camelCase keys; the operations script reads snake_case.
//! Only keys are rewritten; values, array order and array length are untouched.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{BridgeError, Result};

/// Recursive key/value structure describing an operation's arguments.
pub type ParameterBag = Map<String, Value>;

/// Rewrites every key of `bag` (and of every object nested in it, including
/// objects inside arrays) to snake_case.
pub fn normalize(bag: &ParameterBag) -> ParameterBag {
    bag.iter()
        .map(|(key, value)| (to_snake_case(key), normalize_value(value)))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize(map)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        scalar => scalar.clone(),
    }
}

/// Looks `key` up by its normalized name, so `newPath` also finds `new_path`.
pub fn get_param<'a>(bag: &'a ParameterBag, key: &str) -> Option<&'a Value> {
    if let Some(value) = bag.get(key) {
        return Some(value);
    }
    let wanted = to_snake_case(key);
    bag.iter()
        .find(|(candidate, _)| to_snake_case(candidate) == wanted)
        .map(|(_, value)| value)
}

/// Rejects a bag (or any object nested in it) where two keys normalize to the
/// same name. Normalizing such a bag would silently keep only one of them.
pub fn ensure_unambiguous(bag: &ParameterBag) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(bag.len());
    for (key, value) in bag {
        if let Some(first) = seen.insert(to_snake_case(key), key) {
            return Err(BridgeError::validation(format!(
                "Parameters '{first}' and '{key}' name the same argument"
            )));
        }
        ensure_unambiguous_value(value)?;
    }
    Ok(())
}

fn ensure_unambiguous_value(value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => ensure_unambiguous(map),
        Value::Array(items) => items.iter().try_for_each(ensure_unambiguous_value),
        _ => Ok(()),
    }
}

/// Inserts `_` before an upper-case letter that follows a lower-case letter or
/// digit, then lower-cases the whole key. Already snake_case keys come back
/// unchanged.
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if c.is_uppercase() {
            if let Some(p) = prev {
                if p.is_lowercase() || p.is_ascii_digit() {
                    out.push('_');
                }
            }
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }
    out
}
