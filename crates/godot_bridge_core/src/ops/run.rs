use std::path::Path;

use super::str_param;
use crate::{
    executor::require_godot_path, supervisor::LaunchSpec, BridgeError, GodotConfig,
    ParameterBag, ProcessSupervisor, Result,
};

/// `godot -d --path <project> [<scene>]`
pub fn launch_spec(config: &GodotConfig, project: &Path, params: &ParameterBag) -> Result<LaunchSpec> {
    let godot = require_godot_path(config)?;
    let mut spec = LaunchSpec::new(godot)
        .arg("-d")
        .arg("--path")
        .arg(project.as_os_str());
    let scene = str_param(params, "scene");
    if !scene.is_empty() {
        spec = spec.arg(scene);
    }
    Ok(spec)
}

/// Starts a debug run. A running project is stopped first unless the caller
/// passed `restart: false`, which turns that case into a conflict.
pub async fn run_project(
    supervisor: &ProcessSupervisor,
    config: &GodotConfig,
    project: &Path,
    params: ParameterBag,
) -> Result<String> {
    let spec = launch_spec(config, project, &params)?;
    let restart = params
        .get("restart")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(true);

    let started = if restart {
        supervisor.start(&spec).await?
    } else {
        supervisor.try_start(&spec).await?
    };

    let pid = started
        .pid
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let replaced = if started.replaced_previous {
        " The previous run was stopped."
    } else {
        ""
    };
    Ok(format!(
        "Godot project started in debug mode (pid {pid}).{replaced} Use get_debug_output to see output."
    ))
}

pub async fn debug_output(supervisor: &ProcessSupervisor) -> Result<String> {
    let snapshot = supervisor
        .active()
        .await
        .ok_or(BridgeError::NoActiveProcess)?;
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "output": snapshot.output,
        "errors": snapshot.errors,
    }))?)
}

pub async fn stop_project(supervisor: &ProcessSupervisor) -> Result<String> {
    let snapshot = supervisor.stop().await.ok_or(BridgeError::NoActiveProcess)?;
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "message": "Godot project stopped",
        "finalOutput": snapshot.output,
        "finalErrors": snapshot.errors,
    }))?)
}
