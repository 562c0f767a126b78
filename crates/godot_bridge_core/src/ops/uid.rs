use std::path::Path;

use super::{run_discrete, str_param, version, with_output};
use crate::{params::to_snake_case, BridgeError, Operation, OperationExecutor, ParameterBag, Result};

async fn ensure_uid_support(executor: &OperationExecutor) -> Result<()> {
    let found = version::godot_version(executor).await?;
    if version::supports_uids(&found) {
        Ok(())
    } else {
        let (major, minor) = version::MIN_UID_VERSION;
        Err(BridgeError::validation(format!(
            "UIDs require Godot {major}.{minor} or later; found {}",
            found.raw
        )))
    }
}

pub async fn get_uid(
    executor: &OperationExecutor,
    project: &Path,
    params: ParameterBag,
) -> Result<String> {
    ensure_uid_support(executor).await?;
    let result = run_discrete(executor, Operation::GetUid, project, &params).await?;
    Ok(format!(
        "UID for {}: {}",
        str_param(&params, "filePath"),
        result.stdout().trim()
    ))
}

/// Resaves every resource so the engine writes missing UIDs.
pub async fn update_project_uids(
    executor: &OperationExecutor,
    project: &Path,
    mut params: ParameterBag,
) -> Result<String> {
    ensure_uid_support(executor).await?;
    params.retain(|key, _| to_snake_case(key) != "project_path");
    params.insert(
        "projectPath".to_string(),
        project.to_string_lossy().into_owned().into(),
    );
    let result = run_discrete(executor, Operation::UpdateProjectUids, project, &params).await?;
    Ok(with_output(
        "Project UIDs updated successfully.".to_string(),
        &result,
    ))
}
