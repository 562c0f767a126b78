use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid parameters: {0}")]
    Validation(String),

    #[error("Failed to start Godot: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Godot operation failed (exit code {exit_code}): {stderr}")]
    ExecutionFailed { exit_code: i32, stderr: String },

    #[error("A Godot process is already running: {0}")]
    SupervisionConflict(String),

    #[error("No active Godot process.")]
    NoActiveProcess,

    #[error("Unrecognized Godot version string: '{0}'")]
    UnrecognizedVersion(String),

    #[error("Godot operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn execution_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Remediation hints shown to the client next to the error message.
    /// Never empty.
    pub fn suggestions(&self) -> Vec<String> {
        let hints: &[&str] = match self {
            Self::Configuration(_) => &[
                "Set the GODOT_PATH environment variable to the Godot executable",
                "Ensure Godot is installed and the path points to the binary, not its folder",
            ],
            Self::Validation(_) => &[
                "Provide valid paths without \"..\"",
                "Check that all required parameters are present",
            ],
            Self::Spawn(_) => &[
                "Ensure Godot is installed correctly",
                "Check that the executable has execute permissions",
            ],
            Self::ExecutionFailed { .. } => &[
                "Check if the paths are correct and the files exist",
                "Ensure the node types and property names are valid",
                "Run with DEBUG_GODOT=true to get verbose engine output",
            ],
            Self::SupervisionConflict(_) => &[
                "Stop the running project with stop_project before starting another one",
            ],
            Self::NoActiveProcess => &[
                "Use run_project to start a Godot project first",
                "The process may have already terminated",
            ],
            Self::UnrecognizedVersion(_) => &[
                "Check that GODOT_PATH points to a Godot 4.x executable",
                "Run the executable with --version to see what it reports",
            ],
            Self::Timeout(_) => &[
                "Increase GODOT_OPERATION_TIMEOUT_MS",
                "Check whether the operation is waiting on an editor dialog",
            ],
            Self::Io(_) | Self::Json(_) => &[
                "Check the server logs for details",
                "Retry the operation",
            ],
        };
        hints.iter().map(|h| h.to_string()).collect()
    }
}
