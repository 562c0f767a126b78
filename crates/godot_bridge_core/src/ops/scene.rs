use std::path::Path;

use super::{run_discrete, set_default, str_param, with_output};
use crate::{Operation, OperationExecutor, ParameterBag, Result};

const DEFAULT_ROOT_NODE_TYPE: &str = "Node2D";
const DEFAULT_PARENT_NODE_PATH: &str = "root";

pub async fn create_scene(
    executor: &OperationExecutor,
    project: &Path,
    mut params: ParameterBag,
) -> Result<String> {
    set_default(&mut params, "rootNodeType", DEFAULT_ROOT_NODE_TYPE);
    let result = run_discrete(executor, Operation::CreateScene, project, &params).await?;
    Ok(with_output(
        format!(
            "Scene created successfully at: {}",
            str_param(&params, "scenePath")
        ),
        &result,
    ))
}

pub async fn add_node(
    executor: &OperationExecutor,
    project: &Path,
    mut params: ParameterBag,
) -> Result<String> {
    set_default(&mut params, "parentNodePath", DEFAULT_PARENT_NODE_PATH);
    let result = run_discrete(executor, Operation::AddNode, project, &params).await?;
    Ok(with_output(
        format!(
            "Node '{}' of type '{}' added successfully to '{}'.",
            str_param(&params, "nodeName"),
            str_param(&params, "nodeType"),
            str_param(&params, "scenePath"),
        ),
        &result,
    ))
}

pub async fn load_sprite(
    executor: &OperationExecutor,
    project: &Path,
    params: ParameterBag,
) -> Result<String> {
    let result = run_discrete(executor, Operation::LoadSprite, project, &params).await?;
    Ok(with_output(
        format!(
            "Sprite loaded successfully with texture: {}",
            str_param(&params, "texturePath")
        ),
        &result,
    ))
}

pub async fn save_scene(
    executor: &OperationExecutor,
    project: &Path,
    params: ParameterBag,
) -> Result<String> {
    let result = run_discrete(executor, Operation::SaveScene, project, &params).await?;
    let target = match str_param(&params, "newPath") {
        "" => str_param(&params, "scenePath"),
        new_path => new_path,
    };
    Ok(with_output(
        format!("Scene saved successfully to: {target}"),
        &result,
    ))
}
