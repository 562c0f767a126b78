//! Single-slot supervision of the long-running Godot debug process.
//!
//! At most one [`SupervisedProcess`] is active per [`ProcessSupervisor`]. Its
//! stdout and stderr are split into lines as bytes arrive and kept in bounded
//! buffers that can be read at any time.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Weak,
};
use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    sync::{oneshot, watch, Mutex},
    task::JoinHandle,
    time::timeout,
};

use crate::{
    executor::exit_code,
    types::{ProcessSnapshot, RunStarted},
    BridgeError, Result,
};

pub const MAX_CAPTURED_LINES: usize = 10_000;
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
/// How long a stopped run gets to exit after SIGTERM before it is killed.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(2);

type LineBuffer = Arc<Mutex<VecDeque<String>>>;
type Slot = Arc<Mutex<Option<SupervisedProcess>>>;

/// Program and arguments of a supervised run.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// A running child owned by a monitor task. Dropping the handle kills the child.
pub struct SupervisedProcess {
    generation: u64,
    pid: Option<u32>,
    output: LineBuffer,
    errors: LineBuffer,
    kill_tx: Option<oneshot::Sender<()>>,
    exited: watch::Receiver<Option<i32>>,
}

impl SupervisedProcess {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn exit_code(&self) -> Option<i32> {
        *self.exited.borrow()
    }

    pub async fn snapshot(&self) -> ProcessSnapshot {
        let output = self.output.lock().await.iter().cloned().collect();
        let errors = self.errors.lock().await.iter().cloned().collect();
        ProcessSnapshot {
            pid: self.pid,
            output,
            errors,
            exit_code: self.exit_code(),
        }
    }

    /// Asks the child to exit (SIGTERM on Unix), kills it if it is still alive
    /// after [`TERMINATE_GRACE`], waits for it to be reaped and for the line
    /// readers to drain, then returns everything captured. Dropping the handle
    /// instead kills the child immediately.
    pub async fn terminate(mut self) -> ProcessSnapshot {
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }
        if self.exited.wait_for(Option::is_some).await.is_err() {
            tracing::warn!(pid = ?self.pid, "Godot monitor task ended without reporting an exit code");
        }
        self.snapshot().await
    }
}

/// Owner of the single "active run" slot.
#[derive(Clone, Default)]
pub struct ProcessSupervisor {
    slot: Slot,
    next_generation: Arc<AtomicU64>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a supervised child. Returns once the OS has created the process;
    /// the handle is not placed in the slot.
    pub fn spawn(&self, spec: &LaunchSpec) -> Result<SupervisedProcess> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(BridgeError::Spawn)?;
        let pid = child.id();

        let output: LineBuffer = Arc::new(Mutex::new(VecDeque::new()));
        let errors: LineBuffer = Arc::new(Mutex::new(VecDeque::new()));

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(capture_lines(stdout, output.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(capture_lines(stderr, errors.clone())));
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let (kill_tx, kill_rx) = oneshot::channel();
        let (exited_tx, exited_rx) = watch::channel(None);

        tokio::spawn(monitor(
            child,
            kill_rx,
            readers,
            exited_tx,
            Arc::downgrade(&self.slot),
            generation,
        ));

        tracing::info!(
            program = %spec.program.display(),
            pid = ?pid,
            "Started supervised Godot process"
        );

        Ok(SupervisedProcess {
            generation,
            pid,
            output,
            errors,
            kill_tx: Some(kill_tx),
            exited: exited_rx,
        })
    }

    /// Puts `process` in the slot and hands back whatever was there.
    /// Stopping the returned process is the caller's job; dropping it kills it.
    pub async fn set_active(&self, process: SupervisedProcess) -> Option<SupervisedProcess> {
        self.slot.lock().await.replace(process)
    }

    /// Snapshot of the active run, if any.
    pub async fn active(&self) -> Option<ProcessSnapshot> {
        let slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(process) => Some(process.snapshot().await),
            None => None,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Stops the active run (if any), then spawns and installs the new one.
    /// The slot stays locked throughout so racing starts cannot both win.
    pub async fn start(&self, spec: &LaunchSpec) -> Result<RunStarted> {
        let mut slot = self.slot.lock().await;

        let replaced_previous = match slot.take() {
            Some(previous) => {
                tracing::info!(pid = ?previous.pid(), "Stopping previous Godot run before starting a new one");
                previous.terminate().await;
                true
            }
            None => false,
        };

        let process = self.spawn(spec)?;
        let pid = process.pid();
        *slot = Some(process);
        Ok(RunStarted {
            pid,
            replaced_previous,
        })
    }

    /// Like [`start`](Self::start) but refuses to replace a running process.
    pub async fn try_start(&self, spec: &LaunchSpec) -> Result<RunStarted> {
        let mut slot = self.slot.lock().await;
        if let Some(active) = slot.as_ref() {
            return Err(BridgeError::SupervisionConflict(format!(
                "pid {}",
                active
                    .pid()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            )));
        }

        let process = self.spawn(spec)?;
        let pid = process.pid();
        *slot = Some(process);
        Ok(RunStarted {
            pid,
            replaced_previous: false,
        })
    }

    /// Stops the active run and returns its captured lines. `None` when idle.
    pub async fn stop(&self) -> Option<ProcessSnapshot> {
        let process = self.slot.lock().await.take()?;
        let pid = process.pid();
        let snapshot = process.terminate().await;
        tracing::info!(pid = ?pid, "Stopped supervised Godot process");
        Some(snapshot)
    }

    /// Idempotent; a no-op when nothing is running.
    pub async fn cleanup(&self) {
        if let Some(snapshot) = self.stop().await {
            tracing::debug!(pid = ?snapshot.pid, "Cleaned up active Godot process");
        }
    }
}

async fn monitor(
    mut child: Child,
    mut kill_rx: oneshot::Receiver<()>,
    readers: Vec<JoinHandle<()>>,
    exited_tx: watch::Sender<Option<i32>>,
    slot: Weak<Mutex<Option<SupervisedProcess>>>,
    generation: u64,
) {
    let (status, natural_exit) = tokio::select! {
        status = child.wait() => (status, true),
        stop = &mut kill_rx => {
            // A dropped handle closes the channel; only an explicit stop gets a grace period.
            if stop.is_ok() {
                request_exit(&child);
                let graceful = timeout(TERMINATE_GRACE, child.wait()).await;
                match graceful {
                    Ok(status) => (status, false),
                    Err(_) => {
                        tracing::warn!(pid = ?child.id(), "Godot process ignored SIGTERM; killing it");
                        (kill(&mut child).await, false)
                    }
                }
            } else {
                (kill(&mut child).await, false)
            }
        }
    };

    let code = match status {
        Ok(status) => exit_code(status),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to wait for Godot process");
            -1
        }
    };

    for reader in readers {
        let abort = reader.abort_handle();
        if timeout(READER_DRAIN_TIMEOUT, reader).await.is_err() {
            tracing::warn!("Output pipe still open after Godot exited; abandoning reader");
            abort.abort();
        }
    }

    exited_tx.send_replace(Some(code));

    if let (true, Some(slot)) = (natural_exit, slot.upgrade()) {
        let mut slot = slot.lock().await;
        if slot.as_ref().map(|p| p.generation) == Some(generation) {
            *slot = None;
            tracing::info!(exit_code = code, "Godot process exited");
        }
    }
}

async fn kill(child: &mut Child) -> std::io::Result<std::process::ExitStatus> {
    if let Err(e) = child.start_kill() {
        tracing::warn!(error = %e, "Failed to kill Godot process");
    }
    child.wait().await
}

#[cfg(unix)]
fn request_exit(child: &Child) {
    let Some(pid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: `pid` belongs to a child this process has not reaped yet.
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        tracing::warn!(
            pid,
            error = %std::io::Error::last_os_error(),
            "Failed to send SIGTERM to Godot process"
        );
    }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) {}

async fn capture_lines<R: AsyncRead + Unpin>(reader: R, buffer: LineBuffer) {
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw).await {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&raw);
                let mut lines = buffer.lock().await;
                push_line(&mut lines, line);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed reading Godot output pipe");
                break;
            }
        }
    }
}

/// A fragment without a trailing newline (end of stream) is kept as a line.
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn push_line(lines: &mut VecDeque<String>, line: String) {
    lines.push_back(line);
    while lines.len() > MAX_CAPTURED_LINES {
        lines.pop_front();
    }
}
