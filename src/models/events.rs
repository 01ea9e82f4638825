//! Events exchanged between the process handles, the pipelines and the UI layer

use crate::models::build::{BuildPhase, BuildReport};
use crate::models::output::OutputLine;

/// Lifecycle notification from a process handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEventKind {
    Started,
    /// Raw bytes from the merged stdout/stderr stream
    OutputChunk(Vec<u8>),
    /// Exit code, `None` when the process was terminated by a signal
    Finished(Option<i32>),
}

/// A process event tagged with the phase whose handle emitted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEvent {
    pub phase: BuildPhase,
    pub kind: ProcessEventKind,
}

impl ProcessEvent {
    pub fn new(phase: BuildPhase, kind: ProcessEventKind) -> Self {
        Self { phase, kind }
    }
}

/// Build pipeline notifications delivered to registered listeners
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    PhaseStarted { phase: BuildPhase, command: String },
    Output(OutputLine),
    PhaseFinished(BuildReport),
}
