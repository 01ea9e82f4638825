//! QkBrew - firmware build manager for QkThings boards
//!
//! QkBrew drives the make-based toolchain of a QkThings firmware project
//! (clean, compile and upload, one phase at a time) and keeps a tag index of
//! the project sources fresh for completion and highlighting while editing.

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod platform;
pub mod projects;
pub mod serial;
pub mod tags;
pub mod utils;

// Re-export commonly used types
pub use build::{BuildPipeline, MakeProcess, MakefileGenerator, ProcessRunner};
pub use config::IdeConfig;
pub use errors::{BrewError, Result};
pub use models::{
    BuildEvent, BuildPhase, BuildReport, BuildTarget, ElementSet, LineClass, OutputLine,
    PipelineState, Project, SourceElement,
};
pub use tags::{CodeParser, EditorPage, TagPipeline};

/// QkBrew version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// QkBrew application name
pub const APP_NAME: &str = "qkbrew";
