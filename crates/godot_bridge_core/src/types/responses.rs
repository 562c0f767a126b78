use serde::{Deserialize, Serialize};

/// Lines captured from a supervised run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: Option<u32>,
    pub output: Vec<String>,
    pub errors: Vec<String>,
    /// Set once the process has exited.
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStarted {
    pub pid: Option<u32>,
    pub replaced_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GodotVersion {
    pub raw: String,
    pub major: u32,
    pub minor: u32,
}
