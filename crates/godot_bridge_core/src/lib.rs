//! Godot Bridge Core
//!
//! A reusable async library for driving the Godot engine executable as a subprocess.
//! Normalizes tool parameters, runs one-shot headless operations through the
//! operations script, supervises a single long-running project run and translates
//! every failure into a uniform [`ToolResponse`].

pub mod bridge;
pub mod config;
pub mod error;
pub mod executor;
pub mod ops;
pub mod params;
pub mod path_safety;
pub mod response;
pub mod supervisor;
pub mod types;

// Re-export commonly used types
pub use bridge::GodotBridge;
pub use config::GodotConfig;
pub use error::BridgeError;
pub use executor::{ExecutionResult, OperationExecutor};
pub use params::{normalize, ParameterBag};
pub use path_safety::is_safe_path;
pub use response::{ContentBlock, ToolResponse};
pub use supervisor::ProcessSupervisor;
pub use types::Operation;

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;
