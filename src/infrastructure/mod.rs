// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the pipeline
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod asset_storage;
pub mod process;

pub use asset_storage::{is_safe_segment, AssetKind, AssetStorage};
pub use process::{run_tool, ToolError};
