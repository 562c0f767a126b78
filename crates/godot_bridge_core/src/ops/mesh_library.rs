use std::path::Path;

use super::{run_discrete, str_param, with_output};
use crate::{Operation, OperationExecutor, ParameterBag, Result};

pub async fn export_mesh_library(
    executor: &OperationExecutor,
    project: &Path,
    params: ParameterBag,
) -> Result<String> {
    let result = run_discrete(executor, Operation::ExportMeshLibrary, project, &params).await?;
    Ok(with_output(
        format!(
            "MeshLibrary exported successfully to: {}",
            str_param(&params, "outputPath")
        ),
        &result,
    ))
}
