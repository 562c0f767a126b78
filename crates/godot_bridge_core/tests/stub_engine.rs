// Integration tests that drive the bridge against stub Godot executables.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use godot_bridge_core::{GodotBridge, GodotConfig, OperationExecutor, ParameterBag};
use serde_json::{json, Value};
use tempfile::TempDir;

struct StubProject {
    dir: TempDir,
    godot: PathBuf,
}

impl StubProject {
    /// A project directory with `project.godot` and a stub engine whose body is `script`.
    fn new(script: &str) -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        std::fs::write(dir.path().join("project.godot"), "config_version=5\n")
            .expect("project file should be written");

        let godot = dir.path().join("fake-godot.sh");
        std::fs::write(&godot, format!("#!/bin/sh\n{script}\n")).expect("stub should be written");
        std::fs::set_permissions(&godot, std::fs::Permissions::from_mode(0o755))
            .expect("stub should be executable");

        Self { dir, godot }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn project_arg(&self) -> Option<String> {
        Some(self.path().to_string_lossy().into_owned())
    }

    fn marker(&self) -> PathBuf {
        self.path().join("invoked.marker")
    }

    fn config(&self) -> GodotConfig {
        GodotConfig::new(self.path().join("ops.gd"), Some(self.godot.clone()))
    }

    fn bridge(&self) -> GodotBridge {
        GodotBridge::new(self.config())
    }
}

fn bag(value: Value) -> ParameterBag {
    value.as_object().cloned().expect("test params must be an object")
}

async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

#[tokio::test]
async fn execute_returns_exact_stdout_with_empty_stderr_and_zero_exit() {
    let stub = StubProject::new("printf 'scene ok\\nsecond line\\n'");
    let executor = OperationExecutor::new(std::sync::Arc::new(tokio::sync::RwLock::new(
        stub.config(),
    )));

    let result = executor
        .execute("create_scene", &bag(json!({ "scenePath": "a.tscn" })), stub.path())
        .await
        .expect("stub should run");

    assert_eq!(result.stdout(), "scene ok\nsecond line\n");
    assert_eq!(result.stderr(), "");
    assert_eq!(result.exit_code(), 0);
}

#[tokio::test]
async fn execute_passes_normalized_payload_as_single_argument() {
    let stub = StubProject::new("for arg in \"$@\"; do printf '%s\\n' \"$arg\"; done");
    let executor = OperationExecutor::new(std::sync::Arc::new(tokio::sync::RwLock::new(
        stub.config().with_debug_godot(true),
    )));

    let params = bag(json!({
        "scenePath": "res://main.tscn",
        "nodeName": "Hero Sprite",
        "properties": { "zIndex": 2, "flipH": true }
    }));
    let result = executor
        .execute("add_node", &params, stub.path())
        .await
        .expect("stub should run");

    let lines: Vec<&str> = result.stdout().lines().collect();
    assert_eq!(lines.len(), 8, "unexpected argv: {lines:?}");
    assert_eq!(lines[0], "--headless");
    assert_eq!(lines[1], "--path");
    assert_eq!(Path::new(lines[2]), stub.path());
    assert_eq!(lines[3], "--script");
    assert_eq!(Path::new(lines[4]), stub.path().join("ops.gd"));
    assert_eq!(lines[5], "add_node");
    let payload: Value = serde_json::from_str(lines[6]).expect("payload should be JSON");
    assert_eq!(
        payload,
        json!({
            "scene_path": "res://main.tscn",
            "node_name": "Hero Sprite",
            "properties": { "z_index": 2, "flip_h": true }
        })
    );
    assert_eq!(lines[7], "--debug-godot");
}

#[tokio::test]
async fn stderr_with_zero_exit_is_an_error_response() {
    let stub = StubProject::new("echo 'ERROR: Cannot load scene' >&2; exit 0");
    let response = stub
        .bridge()
        .dispatch(
            "create_scene",
            bag(json!({ "scenePath": "broken.tscn" })),
            stub.project_arg(),
        )
        .await;

    assert!(response.is_error);
    assert!(
        response.content[0].as_text().contains("ERROR: Cannot load scene"),
        "unexpected response: {response:?}"
    );
    assert!(response.content[1].as_text().starts_with("Possible solutions:"));
}

#[tokio::test]
async fn non_zero_exit_is_an_error_response() {
    let stub = StubProject::new("exit 3");
    let response = stub
        .bridge()
        .dispatch(
            "save_scene",
            bag(json!({ "scenePath": "main.tscn" })),
            stub.project_arg(),
        )
        .await;

    assert!(response.is_error);
    assert!(response.content[0].as_text().contains("exit code 3"));
}

#[tokio::test]
async fn create_scene_success_reports_scene_and_output() {
    let stub = StubProject::new("echo 'Scene saved'");
    let response = stub
        .bridge()
        .dispatch(
            "create_scene",
            bag(json!({ "scenePath": "scenes/main.tscn" })),
            stub.project_arg(),
        )
        .await;

    assert!(!response.is_error, "unexpected error: {response:?}");
    assert_eq!(
        response.text(),
        "Scene created successfully at: scenes/main.tscn\n\nOutput: Scene saved"
    );
}

#[tokio::test]
async fn create_scene_applies_default_root_node_type() {
    let stub = StubProject::new("printf '%s' \"$7\"");
    let response = stub
        .bridge()
        .dispatch(
            "create_scene",
            bag(json!({ "scenePath": "main.tscn" })),
            stub.project_arg(),
        )
        .await;

    assert!(!response.is_error, "unexpected error: {response:?}");
    assert!(response.text().contains(r#""root_node_type":"Node2D""#));
}

#[tokio::test]
async fn export_mesh_library_forwards_item_names_and_reports_output_path() {
    let stub = StubProject::new("printf '%s' \"$7\"");
    let response = stub
        .bridge()
        .dispatch(
            "export_mesh_library",
            bag(json!({
                "scenePath": "meshes.tscn",
                "outputPath": "lib/meshes.res",
                "meshItemNames": ["TreeMesh"]
            })),
            stub.project_arg(),
        )
        .await;

    assert!(!response.is_error, "unexpected error: {response:?}");
    let text = response.text();
    assert!(text.starts_with("MeshLibrary exported successfully to: lib/meshes.res"));
    assert!(text.contains(r#""mesh_item_names":["TreeMesh"]"#), "unexpected output: {text}");
}

#[tokio::test]
async fn unsafe_paths_are_rejected_before_spawning() {
    let stub = StubProject::new("");
    let script = format!("touch '{}'", stub.marker().display());
    let stub = rewrite_stub(stub, &script);

    let response = stub
        .bridge()
        .dispatch(
            "load_sprite",
            bag(json!({
                "scenePath": "main.tscn",
                "nodePath": "root/Sprite",
                "texturePath": "../../outside.png"
            })),
            stub.project_arg(),
        )
        .await;

    assert!(response.is_error);
    assert!(response.content[0].as_text().contains("texturePath"));
    assert!(!stub.marker().exists(), "engine must not be invoked");
}

#[tokio::test]
async fn snake_case_path_keys_cannot_bypass_path_checks() {
    let stub = StubProject::new("");
    let script = format!("touch '{}'", stub.marker().display());
    let stub = rewrite_stub(stub, &script);
    let bridge = stub.bridge();

    let both_spellings = bridge
        .dispatch(
            "load_sprite",
            bag(json!({
                "scenePath": "main.tscn",
                "nodePath": "root/Sprite",
                "texturePath": "ok.png",
                "texture_path": "../../../etc/passwd"
            })),
            stub.project_arg(),
        )
        .await;
    assert!(both_spellings.is_error, "unexpected success: {both_spellings:?}");

    let snake_only = bridge
        .dispatch(
            "save_scene",
            bag(json!({ "scenePath": "main.tscn", "new_path": "../../outside.tscn" })),
            stub.project_arg(),
        )
        .await;
    assert!(snake_only.is_error, "unexpected success: {snake_only:?}");
    assert!(snake_only.content[0].as_text().contains("new_path"));

    assert!(!stub.marker().exists(), "engine must not be invoked");
}

#[tokio::test]
async fn snake_case_parameters_reach_the_engine_once() {
    let stub = StubProject::new("printf '%s' \"$7\"");
    let response = stub
        .bridge()
        .dispatch(
            "create_scene",
            bag(json!({ "scene_path": "main.tscn", "root_node_type": "Node3D" })),
            stub.project_arg(),
        )
        .await;

    assert!(!response.is_error, "unexpected error: {response:?}");
    let text = response.text();
    assert!(text.starts_with("Scene created successfully at: main.tscn"));
    assert!(text.contains(r#""root_node_type":"Node3D""#), "unexpected output: {text}");
}

#[tokio::test]
async fn missing_required_parameter_is_rejected() {
    let stub = StubProject::new("echo never");
    let response = stub
        .bridge()
        .dispatch(
            "add_node",
            bag(json!({ "scenePath": "main.tscn", "nodeType": "Node2D" })),
            stub.project_arg(),
        )
        .await;

    assert!(response.is_error);
    assert!(response.content[0].as_text().contains("nodeName"));
}

#[tokio::test]
async fn get_uid_requires_godot_4_4() {
    let stub = StubProject::new(
        "if [ \"$1\" = \"--version\" ]; then echo '4.3.stable.official'; exit 0; fi\necho uid://never",
    );
    let response = stub
        .bridge()
        .dispatch(
            "get_uid",
            bag(json!({ "filePath": "scenes/main.tscn" })),
            stub.project_arg(),
        )
        .await;

    assert!(response.is_error);
    assert!(
        response.content[0].as_text().contains("4.4"),
        "unexpected response: {response:?}"
    );
}

#[tokio::test]
async fn get_uid_returns_trimmed_uid() {
    let stub = StubProject::new(
        "if [ \"$1\" = \"--version\" ]; then echo '4.4.1.stable.official'; exit 0; fi\necho '  uid://cecaux1sm7mo0  '",
    );
    let response = stub
        .bridge()
        .dispatch(
            "get_uid",
            bag(json!({ "filePath": "scenes/main.tscn" })),
            stub.project_arg(),
        )
        .await;

    assert!(!response.is_error, "unexpected error: {response:?}");
    assert_eq!(response.text(), "UID for scenes/main.tscn: uid://cecaux1sm7mo0");
}

#[tokio::test]
async fn update_project_uids_uses_resave_resources_operation() {
    let stub = StubProject::new(
        "if [ \"$1\" = \"--version\" ]; then echo '4.4.stable'; exit 0; fi\nprintf '%s %s' \"$6\" \"$7\"",
    );
    let response = stub
        .bridge()
        .dispatch("update_project_uids", ParameterBag::new(), stub.project_arg())
        .await;

    assert!(!response.is_error, "unexpected error: {response:?}");
    let text = response.text();
    assert!(text.starts_with("Project UIDs updated successfully."));
    assert!(text.contains("resave_resources"));
    assert!(text.contains("\"project_path\""));
}

#[tokio::test]
async fn get_godot_version_returns_trimmed_version() {
    let stub = StubProject::new("echo '4.4.1.stable.official.49a5bc7b6'");
    let response = stub
        .bridge()
        .dispatch("get_godot_version", ParameterBag::new(), None)
        .await;

    assert!(!response.is_error, "unexpected error: {response:?}");
    assert_eq!(response.text(), "4.4.1.stable.official.49a5bc7b6");
}

#[tokio::test]
async fn unparseable_version_points_at_the_executable() {
    let stub = StubProject::new("echo 'not a version'");
    let response = stub
        .bridge()
        .dispatch("get_godot_version", ParameterBag::new(), None)
        .await;

    assert!(response.is_error);
    assert_eq!(
        response.content[0].as_text(),
        "Unrecognized Godot version string: 'not a version'"
    );
    assert!(response.content[1].as_text().contains("GODOT_PATH"));
}

#[tokio::test]
async fn run_project_streams_output_and_stop_returns_final_lines() {
    let stub = StubProject::new("echo 'Godot Engine v4.4'; echo 'WARNING: x' >&2; exec sleep 30");
    let bridge = stub.bridge();

    let started = bridge
        .dispatch("run_project", ParameterBag::new(), stub.project_arg())
        .await;
    assert!(!started.is_error, "unexpected error: {started:?}");
    assert!(started.text().contains("started in debug mode"));

    let streamed = eventually(|| {
        let bridge = bridge.clone();
        async move {
            let response = bridge
                .dispatch("get_debug_output", ParameterBag::new(), None)
                .await;
            !response.is_error && response.text().contains("Godot Engine v4.4")
        }
    })
    .await;
    assert!(streamed, "debug output should contain the engine banner");

    let stopped = bridge
        .dispatch("stop_project", ParameterBag::new(), None)
        .await;
    assert!(!stopped.is_error, "unexpected error: {stopped:?}");
    let body: Value = serde_json::from_str(&stopped.text()).expect("stop returns JSON");
    assert_eq!(body["finalOutput"], json!(["Godot Engine v4.4"]));
    assert_eq!(body["finalErrors"], json!(["WARNING: x"]));

    let after = bridge
        .dispatch("get_debug_output", ParameterBag::new(), None)
        .await;
    assert!(after.is_error);
    assert!(bridge.supervisor().active().await.is_none());
}

#[tokio::test]
async fn run_project_twice_keeps_single_process() {
    let stub = StubProject::new("exec sleep 30");
    let bridge = stub.bridge();

    let first = bridge
        .dispatch("run_project", ParameterBag::new(), stub.project_arg())
        .await;
    assert!(!first.is_error);
    let second = bridge
        .dispatch("run_project", ParameterBag::new(), stub.project_arg())
        .await;
    assert!(!second.is_error);
    assert!(second.text().contains("previous run was stopped"));

    let refused = bridge
        .dispatch(
            "run_project",
            bag(json!({ "restart": false })),
            stub.project_arg(),
        )
        .await;
    assert!(refused.is_error);
    assert!(refused.content[0].as_text().contains("already running"));

    assert!(bridge.supervisor().is_running().await);
    bridge.cleanup().await;
    assert!(!bridge.supervisor().is_running().await);
}

#[tokio::test]
async fn launch_editor_spawns_detached_process() {
    let stub = StubProject::new("");
    let script = format!("[ \"$1\" = \"-e\" ] && touch '{}'", stub.marker().display());
    let stub = rewrite_stub(stub, &script);

    let response = stub
        .bridge()
        .dispatch("launch_editor", ParameterBag::new(), stub.project_arg())
        .await;
    assert!(!response.is_error, "unexpected error: {response:?}");

    let marker = stub.marker();
    let touched = eventually(|| {
        let marker = marker.clone();
        async move { marker.exists() }
    })
    .await;
    assert!(touched, "editor stub should have been launched with -e");
}

#[tokio::test]
async fn operation_timeout_kills_slow_engine() {
    let stub = StubProject::new("exec sleep 30");
    let bridge = GodotBridge::new(
        stub.config()
            .with_operation_timeout(Some(Duration::from_millis(200))),
    );

    let started = Instant::now();
    let response = bridge
        .dispatch(
            "create_scene",
            bag(json!({ "scenePath": "main.tscn" })),
            stub.project_arg(),
        )
        .await;

    assert!(response.is_error);
    assert!(response.content[0].as_text().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// Replaces the stub body once the temp dir (and so the marker path) is known.
fn rewrite_stub(stub: StubProject, script: &str) -> StubProject {
    std::fs::write(&stub.godot, format!("#!/bin/sh\n{script}\n")).expect("stub should be rewritten");
    stub
}
