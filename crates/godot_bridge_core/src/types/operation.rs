use serde::{Deserialize, Serialize};

/// How an operation is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// One-shot headless run of the operations script.
    Discrete,
    /// Touches the single supervised run.
    Supervised,
    /// Spawned and left alone.
    Detached,
    /// Version probe, bounded by its own timeout.
    Probe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateScene,
    AddNode,
    LoadSprite,
    ExportMeshLibrary,
    SaveScene,
    GetUid,
    UpdateProjectUids,
    RunProject,
    StopProject,
    GetDebugOutput,
    LaunchEditor,
    GetGodotVersion,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::CreateScene,
        Operation::AddNode,
        Operation::LoadSprite,
        Operation::ExportMeshLibrary,
        Operation::SaveScene,
        Operation::GetUid,
        Operation::UpdateProjectUids,
        Operation::RunProject,
        Operation::StopProject,
        Operation::GetDebugOutput,
        Operation::LaunchEditor,
        Operation::GetGodotVersion,
    ];

    /// Tool-facing name.
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateScene => "create_scene",
            Self::AddNode => "add_node",
            Self::LoadSprite => "load_sprite",
            Self::ExportMeshLibrary => "export_mesh_library",
            Self::SaveScene => "save_scene",
            Self::GetUid => "get_uid",
            Self::UpdateProjectUids => "update_project_uids",
            Self::RunProject => "run_project",
            Self::StopProject => "stop_project",
            Self::GetDebugOutput => "get_debug_output",
            Self::LaunchEditor => "launch_editor",
            Self::GetGodotVersion => "get_godot_version",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn kind(self) -> OperationKind {
        match self {
            Self::RunProject | Self::StopProject | Self::GetDebugOutput => {
                OperationKind::Supervised
            }
            Self::LaunchEditor => OperationKind::Detached,
            Self::GetGodotVersion => OperationKind::Probe,
            _ => OperationKind::Discrete,
        }
    }

    /// Operation name passed to the operations script, for discrete operations.
    pub fn script_operation(self) -> Option<&'static str> {
        match self {
            Self::CreateScene => Some("create_scene"),
            Self::AddNode => Some("add_node"),
            Self::LoadSprite => Some("load_sprite"),
            Self::ExportMeshLibrary => Some("export_mesh_library"),
            Self::SaveScene => Some("save_scene"),
            Self::GetUid => Some("get_uid"),
            Self::UpdateProjectUids => Some("resave_resources"),
            _ => None,
        }
    }

    /// Whether the call must name a Godot project directory.
    pub fn needs_project(self) -> bool {
        !matches!(
            self,
            Self::StopProject | Self::GetDebugOutput | Self::GetGodotVersion
        )
    }

    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::CreateScene => &["scenePath"],
            Self::AddNode => &["scenePath", "nodeType", "nodeName"],
            Self::LoadSprite => &["scenePath", "nodePath", "texturePath"],
            Self::ExportMeshLibrary => &["scenePath", "outputPath"],
            Self::SaveScene => &["scenePath"],
            Self::GetUid => &["filePath"],
            _ => &[],
        }
    }

    /// Keys whose values end up as filesystem paths.
    pub fn path_keys(self) -> &'static [&'static str] {
        match self {
            Self::CreateScene | Self::AddNode => &["scenePath"],
            Self::LoadSprite => &["scenePath", "texturePath"],
            Self::ExportMeshLibrary => &["scenePath", "outputPath"],
            Self::SaveScene => &["scenePath", "newPath"],
            Self::GetUid => &["filePath"],
            Self::UpdateProjectUids => &["projectPath"],
            Self::RunProject => &["scene"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
