//! Build and upload orchestration
//!
//! This module drives the external make toolchain through the Clean, Verify
//! and Upload phases of a project.

pub mod classifier;
pub mod makefile;
pub mod pipeline;
pub mod process;
pub mod targets;
pub mod upload;

pub use classifier::{LineBuffer, classify};
pub use makefile::{MakefileGenerator, TemplateSource, render_template};
pub use pipeline::{BuildListener, BuildPipeline, PhaseRunners, phase_command};
pub use process::{CommandSpec, MakeProcess, ProcessRunner};
pub use targets::{SupportedTarget, check_target, supported_targets};
pub use upload::UploadCoordinator;
