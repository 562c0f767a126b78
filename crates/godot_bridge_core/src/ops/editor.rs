use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::{executor::require_godot_path, BridgeError, GodotConfig, Result};

/// Opens the Godot editor on `project`. The editor is not supervised; the call
/// returns as soon as the OS has created the process.
pub fn launch_editor(config: &GodotConfig, project: &Path) -> Result<String> {
    let godot = require_godot_path(config)?;
    let child = Command::new(&godot)
        .arg("-e")
        .arg("--path")
        .arg(project)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(BridgeError::Spawn)?;

    tracing::info!(pid = ?child.id(), project = %project.display(), "Launched Godot editor");

    Ok(format!(
        "Godot editor launched successfully for project at {}.",
        project.display()
    ))
}
