use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SCRIPT_RELATIVE_PATH: &str = "scripts/godot_operations.gd";
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for invoking the Godot executable.
///
/// Everything except `godot_path` is fixed at construction. The executable
/// path stays `None` until discovery resolves it.
#[derive(Debug, Clone)]
pub struct GodotConfig {
    pub operations_script: PathBuf,
    pub godot_path: Option<PathBuf>,
    pub debug_godot: bool,
    pub debug_mode: bool,
    pub operation_timeout: Option<Duration>,
    pub version_timeout: Duration,
}

impl Default for GodotConfig {
    fn default() -> Self {
        Self {
            operations_script: default_operations_script(),
            godot_path: None,
            debug_godot: false,
            debug_mode: false,
            operation_timeout: None,
            version_timeout: VERSION_PROBE_TIMEOUT,
        }
    }
}

impl GodotConfig {
    pub fn new(operations_script: impl Into<PathBuf>, godot_path: Option<PathBuf>) -> Self {
        Self {
            operations_script: operations_script.into(),
            godot_path,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let operations_script = std::env::var("GODOT_OPERATIONS_SCRIPT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_operations_script);

        let godot_path = std::env::var("GODOT_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let operation_timeout = std::env::var("GODOT_OPERATION_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Self {
            operations_script,
            godot_path,
            debug_godot: env_flag("DEBUG_GODOT"),
            debug_mode: env_flag("DEBUG"),
            operation_timeout,
            version_timeout: VERSION_PROBE_TIMEOUT,
        }
    }

    pub fn with_debug_godot(mut self, enabled: bool) -> Self {
        self.debug_godot = enabled;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn godot_path(&self) -> Option<&Path> {
        self.godot_path.as_deref()
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn default_operations_script() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SCRIPT_RELATIVE_PATH)
}
