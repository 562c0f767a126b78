//! One module per family of Godot operations.

pub mod editor;
pub mod mesh_library;
pub mod run;
pub mod scene;
pub mod uid;
pub mod version;

use std::path::Path;

use serde_json::Value;

use crate::{
    params::{get_param, to_snake_case},
    ExecutionResult, Operation, OperationExecutor, ParameterBag, Result,
};

/// Runs a discrete operation and fails on a non-zero exit or any stderr output.
pub(crate) async fn run_discrete(
    executor: &OperationExecutor,
    operation: Operation,
    project: &Path,
    params: &ParameterBag,
) -> Result<ExecutionResult> {
    let script_op = operation.script_operation().ok_or_else(|| {
        crate::BridgeError::validation(format!("{operation} is not a discrete operation"))
    })?;
    executor
        .execute(script_op, params, project)
        .await?
        .into_success()
}

pub(crate) fn str_param<'a>(params: &'a ParameterBag, key: &str) -> &'a str {
    get_param(params, key).and_then(Value::as_str).unwrap_or_default()
}

/// Fills `key` when it is absent under either spelling, or null, or empty.
pub(crate) fn set_default(params: &mut ParameterBag, key: &str, value: &str) {
    let wanted = to_snake_case(key);
    let key = params
        .keys()
        .find(|candidate| to_snake_case(candidate) == wanted)
        .cloned()
        .unwrap_or_else(|| key.to_string());
    let missing = match params.get(&key) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if missing {
        params.insert(key, Value::String(value.to_string()));
    }
}

pub(crate) fn with_output(message: String, result: &ExecutionResult) -> String {
    let stdout = result.stdout().trim();
    if stdout.is_empty() {
        message
    } else {
        format!("{message}\n\nOutput: {stdout}")
    }
}
