//! The boundary the tool layer calls through.
//!
//! [`GodotBridge::dispatch`] never fails: validation errors, spawn errors,
//! engine failures and panics all come back as an error-flagged
//! [`ToolResponse`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    ops,
    params::{ensure_unambiguous, get_param},
    path_safety::{ensure_safe_params, ensure_safe_path},
    types::OperationKind,
    BridgeError, GodotConfig, Operation, OperationExecutor, ParameterBag, ProcessSupervisor,
    Result, ToolResponse,
};

const PROJECT_FILE: &str = "project.godot";

#[derive(Clone)]
pub struct GodotBridge {
    config: Arc<RwLock<GodotConfig>>,
    executor: OperationExecutor,
    supervisor: ProcessSupervisor,
}

impl GodotBridge {
    pub fn new(config: GodotConfig) -> Self {
        let config = Arc::new(RwLock::new(config));
        Self {
            executor: OperationExecutor::new(config.clone()),
            supervisor: ProcessSupervisor::new(),
            config,
        }
    }

    /// Called once executable discovery has finished.
    pub async fn set_godot_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::info!(godot = %path.display(), "Using Godot executable");
        self.config.write().await.godot_path = Some(path);
    }

    pub async fn godot_path(&self) -> Option<PathBuf> {
        self.config.read().await.godot_path.clone()
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Stops the supervised run, if any. Safe to call repeatedly.
    pub async fn cleanup(&self) {
        self.supervisor.cleanup().await;
    }

    /// Runs `name` with `params` against `project_path` and wraps the outcome.
    pub async fn dispatch(
        &self,
        name: &str,
        params: ParameterBag,
        project_path: Option<String>,
    ) -> ToolResponse {
        let Some(operation) = Operation::from_name(name) else {
            let known: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
            return ToolResponse::error(
                format!("Unknown operation: {name}"),
                [format!("Use one of: {}", known.join(", "))],
            );
        };

        let bridge = self.clone();
        let task = tokio::spawn(async move { bridge.call(operation, params, project_path).await });

        match task.await {
            Ok(Ok(text)) => ToolResponse::success(text),
            Ok(Err(err)) => {
                tracing::warn!(operation = %operation, error = %err, "Godot operation failed");
                ToolResponse::from(err)
            }
            Err(join_err) => {
                tracing::error!(operation = %operation, error = %join_err, "Godot operation aborted unexpectedly");
                ToolResponse::error(
                    format!("Unexpected failure while running {operation}: {join_err}"),
                    ["Check the server logs for details", "Retry the operation"],
                )
            }
        }
    }

    /// Typed entry point behind [`dispatch`](Self::dispatch).
    pub async fn call(
        &self,
        operation: Operation,
        params: ParameterBag,
        project_path: Option<String>,
    ) -> Result<String> {
        let project = if operation.needs_project() {
            Some(validate_project(project_path.as_deref()).await?)
        } else {
            None
        };
        ensure_unambiguous(&params)?;
        ensure_required(&params, operation.required_keys())?;
        ensure_safe_params(&params, operation.path_keys())?;

        tracing::debug!(operation = %operation, project = ?project, "Dispatching Godot operation");

        let exec = &self.executor;
        match (operation.kind(), project) {
            (OperationKind::Discrete, Some(project)) => match operation {
                Operation::CreateScene => ops::scene::create_scene(exec, &project, params).await,
                Operation::AddNode => ops::scene::add_node(exec, &project, params).await,
                Operation::LoadSprite => ops::scene::load_sprite(exec, &project, params).await,
                Operation::SaveScene => ops::scene::save_scene(exec, &project, params).await,
                Operation::ExportMeshLibrary => {
                    ops::mesh_library::export_mesh_library(exec, &project, params).await
                }
                Operation::GetUid => ops::uid::get_uid(exec, &project, params).await,
                Operation::UpdateProjectUids => {
                    ops::uid::update_project_uids(exec, &project, params).await
                }
                other => Err(BridgeError::validation(format!(
                    "{other} is not a discrete operation"
                ))),
            },
            (OperationKind::Supervised, project) => match (operation, project) {
                (Operation::RunProject, Some(project)) => {
                    let config = self.config.read().await.clone();
                    ops::run::run_project(&self.supervisor, &config, &project, params).await
                }
                (Operation::StopProject, _) => ops::run::stop_project(&self.supervisor).await,
                (Operation::GetDebugOutput, _) => ops::run::debug_output(&self.supervisor).await,
                (other, _) => Err(BridgeError::validation(format!(
                    "{other} requires a project path"
                ))),
            },
            (OperationKind::Detached, Some(project)) => {
                let config = self.config.read().await.clone();
                ops::editor::launch_editor(&config, &project)
            }
            (OperationKind::Probe, _) => {
                let version = ops::version::godot_version(exec).await?;
                Ok(version.raw)
            }
            (_, None) => Err(BridgeError::validation(format!(
                "{operation} requires a project path"
            ))),
        }
    }
}

/// The project path must be safe and point at a directory holding `project.godot`.
async fn validate_project(project_path: Option<&str>) -> Result<PathBuf> {
    let path = project_path.unwrap_or_default();
    ensure_safe_path("projectPath", path)?;

    let project = Path::new(path);
    let is_project = tokio::fs::metadata(project.join(PROJECT_FILE))
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_project {
        return Err(BridgeError::validation(format!(
            "Not a valid Godot project: {path} (no {PROJECT_FILE} found)"
        )));
    }
    Ok(project.to_path_buf())
}

/// Missing, null and empty-string values all count as absent.
fn ensure_required(params: &ParameterBag, keys: &[&str]) -> Result<()> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| match get_param(params, key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BridgeError::validation(format!(
            "Missing required parameter(s): {}",
            missing.join(", ")
        )))
    }
}
