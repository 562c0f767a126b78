use std::path::PathBuf;

use godot_bridge_core::{GodotBridge, GodotConfig, ParameterBag, ToolResponse};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::*,
    tool, tool_handler, tool_router, transport, ErrorData as McpError, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ProjectParams {
    /// Path to the Godot project directory (the folder holding project.godot)
    project_path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RunProjectParams {
    project_path: String,
    /// Optional scene to run instead of the main scene
    #[serde(default)]
    scene: Option<String>,
    /// Stop a running project first (default). When false, a running project is an error.
    #[serde(default)]
    restart: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct NoParams {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateSceneParams {
    project_path: String,
    /// Scene path relative to the project, e.g. scenes/main.tscn
    scene_path: String,
    /// Root node type, defaults to Node2D
    #[serde(default)]
    root_node_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct AddNodeParams {
    project_path: String,
    scene_path: String,
    /// Parent node path, defaults to root
    #[serde(default)]
    parent_node_path: Option<String>,
    node_type: String,
    node_name: String,
    /// Property values to set on the new node
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct LoadSpriteParams {
    project_path: String,
    scene_path: String,
    /// Path to the Sprite2D node in the scene
    node_path: String,
    texture_path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ExportMeshLibraryParams {
    project_path: String,
    scene_path: String,
    /// Where to save the MeshLibrary resource (.res)
    output_path: String,
    /// Only export these meshes; all meshes when omitted
    #[serde(default)]
    mesh_item_names: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SaveSceneParams {
    project_path: String,
    scene_path: String,
    /// Save as a new scene at this path instead of overwriting
    #[serde(default)]
    new_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GetUidParams {
    project_path: String,
    /// File to look up, relative to the project
    file_path: String,
}

/// Serializes tool params into a camelCase bag and pulls out `projectPath`.
/// Null fields are dropped so engine-side defaults apply.
fn split_params<T: Serialize>(params: &T) -> Result<(ParameterBag, Option<String>), McpError> {
    let value = serde_json::to_value(params)
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {e}"), None))?;
    let mut bag = match value {
        Value::Object(map) => map,
        _ => ParameterBag::new(),
    };
    bag.retain(|_, v| !v.is_null());
    let project_path = match bag.remove("projectPath") {
        Some(Value::String(path)) => Some(path),
        _ => None,
    };
    Ok((bag, project_path))
}

fn into_call_result(response: ToolResponse) -> CallToolResult {
    let content = response
        .content
        .iter()
        .map(|block| Content::text(block.as_text()))
        .collect();
    if response.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

#[derive(Clone)]
struct GodotMcpServer {
    tool_router: ToolRouter<Self>,
    bridge: GodotBridge,
}

#[tool_router]
impl GodotMcpServer {
    fn new(bridge: GodotBridge) -> Self {
        Self {
            tool_router: Self::tool_router(),
            bridge,
        }
    }

    async fn forward<T: Serialize>(&self, name: &str, params: &T) -> Result<CallToolResult, McpError> {
        let (bag, project_path) = split_params(params)?;
        let response = self.bridge.dispatch(name, bag, project_path).await;
        Ok(into_call_result(response))
    }

    #[tool(description = "Launch the Godot editor for a specific project")]
    async fn launch_editor(&self, params: Parameters<ProjectParams>) -> Result<CallToolResult, McpError> {
        self.forward("launch_editor", &params.0).await
    }

    #[tool(description = "Run the Godot project and capture its output")]
    async fn run_project(&self, params: Parameters<RunProjectParams>) -> Result<CallToolResult, McpError> {
        self.forward("run_project", &params.0).await
    }

    #[tool(description = "Get the current output and errors of the running Godot project")]
    async fn get_debug_output(&self, params: Parameters<NoParams>) -> Result<CallToolResult, McpError> {
        self.forward("get_debug_output", &params.0).await
    }

    #[tool(description = "Stop the running Godot project")]
    async fn stop_project(&self, params: Parameters<NoParams>) -> Result<CallToolResult, McpError> {
        self.forward("stop_project", &params.0).await
    }

    #[tool(description = "Get the installed Godot version")]
    async fn get_godot_version(&self, params: Parameters<NoParams>) -> Result<CallToolResult, McpError> {
        self.forward("get_godot_version", &params.0).await
    }

    #[tool(description = "Create a new Godot scene file")]
    async fn create_scene(&self, params: Parameters<CreateSceneParams>) -> Result<CallToolResult, McpError> {
        self.forward("create_scene", &params.0).await
    }

    #[tool(description = "Add a node to an existing scene")]
    async fn add_node(&self, params: Parameters<AddNodeParams>) -> Result<CallToolResult, McpError> {
        self.forward("add_node", &params.0).await
    }

    #[tool(description = "Load a texture into a Sprite2D node")]
    async fn load_sprite(&self, params: Parameters<LoadSpriteParams>) -> Result<CallToolResult, McpError> {
        self.forward("load_sprite", &params.0).await
    }

    #[tool(description = "Export a scene as a MeshLibrary resource for GridMap")]
    async fn export_mesh_library(
        &self,
        params: Parameters<ExportMeshLibraryParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("export_mesh_library", &params.0).await
    }

    #[tool(description = "Save changes to a scene file, optionally as a new scene")]
    async fn save_scene(&self, params: Parameters<SaveSceneParams>) -> Result<CallToolResult, McpError> {
        self.forward("save_scene", &params.0).await
    }

    #[tool(description = "Get the UID of a file (Godot 4.4+)")]
    async fn get_uid(&self, params: Parameters<GetUidParams>) -> Result<CallToolResult, McpError> {
        self.forward("get_uid", &params.0).await
    }

    #[tool(description = "Resave all resources so missing UIDs are written (Godot 4.4+)")]
    async fn update_project_uids(&self, params: Parameters<ProjectParams>) -> Result<CallToolResult, McpError> {
        self.forward("update_project_uids", &params.0).await
    }
}

#[tool_handler]
impl ServerHandler for GodotMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Godot MCP Server: headless scene operations and a single supervised project run".into(),
            ),
        }
    }
}

/// Accepts the configured executable only if it exists on disk.
fn discover_godot_path(config: &GodotConfig) -> Option<PathBuf> {
    match config.godot_path() {
        Some(path) if path.is_file() => Some(path.to_path_buf()),
        Some(path) => {
            tracing::warn!(godot = %path.display(), "GODOT_PATH does not point to a file");
            None
        }
        None => {
            tracing::warn!("GODOT_PATH is not set; Godot operations will fail until it is");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GodotConfig::from_env();

    let level = if config.debug_mode {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_ansi(false)
        .init();

    config.godot_path = discover_godot_path(&config);
    let bridge = GodotBridge::new(config);

    let server = GodotMcpServer::new(bridge.clone());
    let transport = transport::stdio();

    tracing::info!("Starting Godot MCP Server on stdio...");

    let service = server.serve(transport).await?;
    tokio::select! {
        result = service.waiting() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
        }
    }

    bridge.cleanup().await;

    Ok(())
}
