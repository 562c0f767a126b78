//! Deny-known-bad check for caller supplied paths.
//!
//! This is a deliberately small policy: it rejects empty strings and anything
//! containing `..`. It does not canonicalize, so it is not a guarantee against
//! every traversal variant (symlinks, encoded separators).

use crate::{params::to_snake_case, BridgeError, ParameterBag, Result};

const PARENT_DIR: &str = "..";

pub fn is_safe_path(path: &str) -> bool {
    !path.is_empty() && !path.contains(PARENT_DIR)
}

/// Validates a single named path parameter.
pub fn ensure_safe_path(name: &str, path: &str) -> Result<()> {
    if is_safe_path(path) {
        Ok(())
    } else {
        Err(BridgeError::validation(format!(
            "Invalid {name}: '{path}' is empty or contains '..'"
        )))
    }
}

/// Validates every entry of `params` whose normalized name matches one of
/// `keys`, so `newPath` and `new_path` are both checked. Absent keys are
/// skipped; present keys must be strings.
pub fn ensure_safe_params(params: &ParameterBag, keys: &[&str]) -> Result<()> {
    let wanted: Vec<String> = keys.iter().map(|key| to_snake_case(key)).collect();
    for (key, value) in params {
        if !wanted.contains(&to_snake_case(key)) {
            continue;
        }
        match value {
            serde_json::Value::String(path) => ensure_safe_path(key, path)?,
            other => {
                return Err(BridgeError::validation(format!(
                    "Invalid {key}: expected a path string, got {other}"
                )));
            }
        }
    }
    Ok(())
}
