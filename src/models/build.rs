//! Build-related data models

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::IdeConfig;

/// One toolchain invocation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildPhase {
    Clean,
    Verify,
    Upload,
}

impl BuildPhase {
    pub const ALL: [BuildPhase; 3] = [BuildPhase::Clean, BuildPhase::Verify, BuildPhase::Upload];

    pub fn name(&self) -> &'static str {
        match self {
            BuildPhase::Clean => "Clean",
            BuildPhase::Verify => "Verify",
            BuildPhase::Upload => "Upload",
        }
    }

    /// The make goal invoked for this phase
    pub fn make_goal(&self) -> &'static str {
        match self {
            BuildPhase::Clean => "clean",
            BuildPhase::Verify => "app",
            BuildPhase::Upload => "upload",
        }
    }

    /// Pipeline state while this phase's process is active
    pub fn active_state(&self) -> PipelineState {
        match self {
            BuildPhase::Clean => PipelineState::Cleaning,
            BuildPhase::Verify => PipelineState::Verifying,
            BuildPhase::Upload => PipelineState::Uploading,
        }
    }

    /// Status line shown when the phase's process has started
    pub fn started_message(&self) -> &'static str {
        match self {
            BuildPhase::Clean => "Cleaning...",
            BuildPhase::Verify => "Compiling...",
            BuildPhase::Upload => "Uploading...",
        }
    }

    /// Status line shown when the phase's process exited with code 0
    pub fn success_message(&self) -> &'static str {
        match self {
            BuildPhase::Upload => "Uploaded",
            _ => "Done",
        }
    }
}

/// Build pipeline state; at most one phase is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Cleaning,
    Verifying,
    Uploading,
}

impl PipelineState {
    pub fn is_active(&self) -> bool {
        !matches!(self, PipelineState::Idle)
    }

    pub fn phase(&self) -> Option<BuildPhase> {
        match self {
            PipelineState::Idle => None,
            PipelineState::Cleaning => Some(BuildPhase::Clean),
            PipelineState::Verifying => Some(BuildPhase::Verify),
            PipelineState::Uploading => Some(BuildPhase::Upload),
        }
    }
}

/// Lifecycle of a reusable process handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    Idle,
    Starting,
    Running,
    /// Exit code, `None` when the process was terminated by a signal
    Finished(Option<i32>),
}

impl ProcessState {
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Running)
    }
}

/// Parameters of one build invocation, captured when a phase starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub toolchain_dir: PathBuf,
    pub emb_dir: PathBuf,
    /// Project directory the firmware is built from
    pub app_dir: PathBuf,
    pub target_name: String,
    pub target_variant: String,
}

impl BuildTarget {
    pub fn new(
        config: &IdeConfig,
        app_dir: &Path,
        target_name: impl Into<String>,
        target_variant: impl Into<String>,
    ) -> Self {
        Self {
            toolchain_dir: config.toolchain_dir(),
            emb_dir: config.emb_dir(),
            app_dir: app_dir.to_path_buf(),
            target_name: target_name.into(),
            target_variant: target_variant.into(),
        }
    }

    /// Target identifier used by the firmware makefiles, e.g. `arduino.uno`
    pub fn target_id(&self) -> String {
        format!("{}.{}", self.target_name, self.target_variant).to_lowercase()
    }
}

/// Outcome of a finished phase, reported to the UI layer
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub phase: BuildPhase,
    /// `None` when the process was killed or never started
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl BuildReport {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.exit_code {
            Some(0) => self.phase.success_message().to_string(),
            Some(code) => format!("{} failed (exit code {})", self.phase.name(), code),
            None => format!("{} terminated", self.phase.name()),
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
