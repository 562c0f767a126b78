use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    sync::RwLock,
    time::timeout,
};

use crate::{params::normalize, BridgeError, GodotConfig, ParameterBag, Result};

/// Captured outcome of one discrete Godot invocation.
///
/// Only built after the child has exited and both pipes reached EOF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

impl ExecutionResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Any stderr content counts as failure even with a zero exit code; the
    /// operations script only writes diagnostics of concern there.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && self.stderr.is_empty()
    }

    pub fn into_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BridgeError::execution_failed(
                self.exit_code,
                self.stderr.trim().to_string(),
            ))
        }
    }
}

/// Runs one-shot headless operations through the operations script.
#[derive(Debug, Clone)]
pub struct OperationExecutor {
    config: Arc<RwLock<GodotConfig>>,
}

impl OperationExecutor {
    pub fn new(config: Arc<RwLock<GodotConfig>>) -> Self {
        Self { config }
    }

    /// Invokes `operation` once and waits for it to finish. `params` may still
    /// use client-side key naming; it is normalized here. Spawn failures are
    /// returned as [`BridgeError::Spawn`] with the OS error intact. No retry.
    pub async fn execute(
        &self,
        operation: &str,
        params: &ParameterBag,
        project_path: &Path,
    ) -> Result<ExecutionResult> {
        let config = self.config.read().await.clone();
        let godot = require_godot_path(&config)?;
        let args = build_operation_args(&config, operation, params, project_path)?;

        tracing::debug!(
            operation = %operation,
            godot = %godot.display(),
            args = ?args,
            "Executing Godot operation"
        );

        let result = run_to_completion(&godot, &args, config.operation_timeout).await?;

        tracing::debug!(
            operation = %operation,
            exit_code = result.exit_code(),
            stdout_bytes = result.stdout().len(),
            stderr_bytes = result.stderr().len(),
            "Godot operation finished"
        );

        Ok(result)
    }

    /// `godot --version`, bounded by the configured probe timeout.
    pub async fn godot_version(&self) -> Result<String> {
        let config = self.config.read().await.clone();
        let godot = require_godot_path(&config)?;
        let result = run_to_completion(
            &godot,
            &[OsString::from("--version")],
            Some(config.version_timeout),
        )
        .await?
        .into_success()?;
        Ok(result.stdout().trim().to_string())
    }
}

pub(crate) fn require_godot_path(config: &GodotConfig) -> Result<PathBuf> {
    config.godot_path.clone().ok_or_else(|| {
        BridgeError::configuration("Godot executable path is not set or could not be found")
    })
}

/// Argument vector for a discrete operation, in the order the operations
/// script expects: `--headless --path <dir> --script <script> <op> <json> [--debug-godot]`.
pub fn build_operation_args(
    config: &GodotConfig,
    operation: &str,
    params: &ParameterBag,
    project_path: &Path,
) -> Result<Vec<OsString>> {
    let payload = serde_json::to_string(&normalize(params))?;

    let mut args: Vec<OsString> = vec![
        "--headless".into(),
        "--path".into(),
        project_path.as_os_str().to_owned(),
        "--script".into(),
        config.operations_script.as_os_str().to_owned(),
        operation.into(),
        payload.into(),
    ];
    if config.debug_godot {
        args.push("--debug-godot".into());
    }
    Ok(args)
}

/// Spawns `program` with its own stdout/stderr pipes and waits for exit.
///
/// When `limit` elapses the child is dropped, which kills it.
pub async fn run_to_completion(
    program: &Path,
    args: &[OsString],
    limit: Option<Duration>,
) -> Result<ExecutionResult> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(BridgeError::Spawn)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| missing_pipe("stderr"))?;

    let collect = async move {
        let (stdout, stderr, status) =
            tokio::try_join!(read_stream(stdout), read_stream(stderr), child.wait())?;
        Ok::<_, std::io::Error>(ExecutionResult::new(stdout, stderr, exit_code(status)))
    };

    let result = match limit {
        Some(limit) => match timeout(limit, collect).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(program = %program.display(), ?limit, "Godot process timed out and was killed");
                return Err(BridgeError::Timeout(limit));
            }
        },
        None => collect.await?,
    };

    Ok(result)
}

async fn read_stream<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn missing_pipe(name: &str) -> BridgeError {
    BridgeError::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        format!("missing {name} pipe for Godot process"),
    ))
}

/// Exit code of a finished process. A signal death maps to `128 + signal`;
/// a status carrying neither code nor signal maps to 0.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    0
}
