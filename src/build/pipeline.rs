//! Clean / Verify / Upload orchestration
//!
//! Each phase refreshes the project's makefile, launches make through the
//! phase's process handle, streams classified output to the listeners and,
//! once the process exits, deletes the makefile and reports the outcome.
//! At most one phase is active; requesting a phase while another is active
//! first drains events until the active one has finished.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::build::classifier::LineBuffer;
use crate::build::makefile::MakefileGenerator;
use crate::build::process::{CommandSpec, MakeProcess, ProcessRunner};
use crate::build::upload::UploadCoordinator;
use crate::config::IdeConfig;
use crate::models::{
    BuildEvent, BuildPhase, BuildReport, BuildTarget, OutputLine, PipelineState, ProcessEvent,
    ProcessEventKind, Project,
};
use crate::platform;
use crate::serial::SerialConnection;

/// Receives build events, synchronously and in registration order
pub trait BuildListener: Send {
    fn handle_build_event(&mut self, event: &BuildEvent);
}

impl<F> BuildListener for F
where
    F: FnMut(&BuildEvent) + Send,
{
    fn handle_build_event(&mut self, event: &BuildEvent) {
        self(event)
    }
}

/// One process handle per phase, created once and reused
pub struct PhaseRunners<R> {
    clean: R,
    verify: R,
    upload: R,
}

impl<R: ProcessRunner> PhaseRunners<R> {
    pub fn from_fn(mut make: impl FnMut(BuildPhase) -> R) -> Self {
        Self {
            clean: make(BuildPhase::Clean),
            verify: make(BuildPhase::Verify),
            upload: make(BuildPhase::Upload),
        }
    }

    pub fn get(&self, phase: BuildPhase) -> &R {
        match phase {
            BuildPhase::Clean => &self.clean,
            BuildPhase::Verify => &self.verify,
            BuildPhase::Upload => &self.upload,
        }
    }

    pub fn get_mut(&mut self, phase: BuildPhase) -> &mut R {
        match phase {
            BuildPhase::Clean => &mut self.clean,
            BuildPhase::Verify => &mut self.verify,
            BuildPhase::Upload => &mut self.upload,
        }
    }
}

/// Command line of a phase for `project`. `port` is only used by Upload.
pub fn phase_command(
    make_program: impl Into<PathBuf>,
    phase: BuildPhase,
    project: &Project,
    port: &str,
) -> CommandSpec {
    let app = project.path.display().to_string();
    let spec = CommandSpec::new(make_program, &project.path).arg(phase.make_goal());

    match phase {
        BuildPhase::Clean => spec.arg(format!("APP={}", app)),
        BuildPhase::Verify => spec
            .arg(format!("APP={}", app))
            .arg(format!("PROJECT_NAME={}", project.name)),
        BuildPhase::Upload => spec
            .arg(format!("PORT={}", platform::device_path(port)))
            .arg(format!("FILE={}", project.binary_path().display())),
    }
}

struct ActiveRun {
    phase: BuildPhase,
    project_dir: PathBuf,
    command: String,
    started_at: DateTime<Local>,
}

/// The build/upload state machine
pub struct BuildPipeline<R: ProcessRunner, S: SerialConnection> {
    config: Arc<IdeConfig>,
    makefile: MakefileGenerator,
    runners: PhaseRunners<R>,
    events: mpsc::UnboundedReceiver<ProcessEvent>,
    upload: UploadCoordinator<S>,
    state: PipelineState,
    active: Option<ActiveRun>,
    lines: LineBuffer,
    listeners: Vec<Box<dyn BuildListener>>,
    last_report: Option<BuildReport>,
}

impl<S: SerialConnection> BuildPipeline<MakeProcess, S> {
    /// Pipeline running the real make toolchain
    pub fn with_make(config: Arc<IdeConfig>, connection: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let runners = PhaseRunners::from_fn(|phase| MakeProcess::new(phase, tx.clone()));
        Self::new(config, runners, rx, connection)
    }
}

impl<R: ProcessRunner, S: SerialConnection> BuildPipeline<R, S> {
    /// `events` must be the receiving end of the channel the runners emit on
    pub fn new(
        config: Arc<IdeConfig>,
        runners: PhaseRunners<R>,
        events: mpsc::UnboundedReceiver<ProcessEvent>,
        connection: S,
    ) -> Self {
        let makefile =
            MakefileGenerator::from_template_path(config.build.makefile_template.as_deref());
        let upload = UploadCoordinator::new(connection, config.serial.reconnect_after_upload);

        Self {
            config,
            makefile,
            runners,
            events,
            upload,
            state: PipelineState::Idle,
            active: None,
            lines: LineBuffer::new(),
            listeners: Vec::new(),
            last_report: None,
        }
    }

    pub fn config(&self) -> &IdeConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn last_report(&self) -> Option<&BuildReport> {
        self.last_report.as_ref()
    }

    pub fn runner(&self, phase: BuildPhase) -> &R {
        self.runners.get(phase)
    }

    pub fn upload_coordinator(&self) -> &UploadCoordinator<S> {
        &self.upload
    }

    pub fn upload_coordinator_mut(&mut self) -> &mut UploadCoordinator<S> {
        &mut self.upload
    }

    pub fn add_listener(&mut self, listener: impl BuildListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub async fn request_clean(&mut self, project: &Project, target: &BuildTarget) -> bool {
        self.request(BuildPhase::Clean, project, target, "").await
    }

    pub async fn request_verify(&mut self, project: &Project, target: &BuildTarget) -> bool {
        self.request(BuildPhase::Verify, project, target, "").await
    }

    /// Upload the project's firmware through `port` (a bare port identifier)
    pub async fn request_upload(
        &mut self,
        project: &Project,
        target: &BuildTarget,
        port: &str,
    ) -> bool {
        self.request(BuildPhase::Upload, project, target, port).await
    }

    /// Start `phase`. Returns `false` when no process was launched; the
    /// reason has already been reported to the listeners.
    async fn request(
        &mut self,
        phase: BuildPhase,
        project: &Project,
        target: &BuildTarget,
        port: &str,
    ) -> bool {
        if let Some(active) = self.state.phase() {
            log::info!(
                "Waiting for {} to finish before {}",
                active.name(),
                phase.name()
            );
            self.run_until_idle().await;
        }
        self.runners.get_mut(phase).wait_for_finished().await;

        if let Err(e) = self.makefile.refresh(&project.path, target) {
            log::error!("{}", e);
            self.emit(&BuildEvent::Output(OutputLine::info(format!(
                "Unable to create makefile: {}",
                e
            ))));
            return false;
        }

        if phase == BuildPhase::Upload {
            self.upload.before_upload();
        }

        let command = phase_command(self.config.make_program(), phase, project, port);
        log::info!("{}: {}", phase.name(), command.display());

        self.state = phase.active_state();
        self.lines.clear();
        self.active = Some(ActiveRun {
            phase,
            project_dir: project.path.clone(),
            command: command.display(),
            started_at: Local::now(),
        });

        if let Err(e) = self.runners.get_mut(phase).start(&command) {
            log::error!("{}", e);
            self.emit(&BuildEvent::Output(OutputLine::info(e.to_string())));
            self.finish_phase(None);
            return false;
        }

        true
    }

    /// Apply one process event; returns the report when it ended the active phase
    pub fn handle_process_event(&mut self, event: ProcessEvent) -> Option<BuildReport> {
        let (phase, command) = match &self.active {
            Some(active) if active.phase == event.phase => (active.phase, active.command.clone()),
            _ => {
                log::debug!("Ignoring stale {} event", event.phase.name());
                return None;
            }
        };

        match event.kind {
            ProcessEventKind::Started => {
                self.emit(&BuildEvent::PhaseStarted { phase, command });
                self.emit(&BuildEvent::Output(OutputLine::info(phase.started_message())));
                None
            }
            ProcessEventKind::OutputChunk(bytes) => {
                for line in self.lines.push(&bytes) {
                    self.emit(&BuildEvent::Output(OutputLine::from_toolchain(line)));
                }
                None
            }
            ProcessEventKind::Finished(code) => {
                if let Some(rest) = self.lines.finish() {
                    self.emit(&BuildEvent::Output(OutputLine::from_toolchain(rest)));
                }
                self.finish_phase(code)
            }
        }
    }

    /// Process events until no phase is active
    pub async fn run_until_idle(&mut self) -> Option<BuildReport> {
        while self.state.is_active() {
            match self.events.recv().await {
                Some(event) => {
                    if let Some(report) = self.handle_process_event(event) {
                        return Some(report);
                    }
                }
                None => {
                    log::error!("Process event channel closed with a phase still active");
                    return self.finish_phase(None);
                }
            }
        }
        None
    }

    /// Kill every process handle and wait for cleanup to complete
    pub async fn shutdown(&mut self) {
        for phase in BuildPhase::ALL {
            self.runners.get_mut(phase).kill();
        }
        self.run_until_idle().await;
    }

    fn finish_phase(&mut self, exit_code: Option<i32>) -> Option<BuildReport> {
        let active = self.active.take()?;

        // Cleanup does not depend on the exit code
        if let Err(e) = self.makefile.remove(&active.project_dir) {
            log::warn!("{}", e);
        }
        if active.phase == BuildPhase::Upload {
            self.upload.after_upload();
        }
        self.state = PipelineState::Idle;

        let report = BuildReport {
            phase: active.phase,
            exit_code,
            started_at: active.started_at,
            finished_at: Local::now(),
        };

        if report.success() {
            log::info!("{}", report.status_text());
        } else {
            log::warn!("{}", report.status_text());
        }

        self.emit(&BuildEvent::Output(OutputLine::info(report.status_text())));
        self.emit(&BuildEvent::PhaseFinished(report.clone()));
        self.last_report = Some(report.clone());
        Some(report)
    }

    fn emit(&mut self, event: &BuildEvent) {
        for listener in &mut self.listeners {
            listener.handle_build_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::new("proj", "/p/proj/", vec![])
    }

    #[test]
    fn test_clean_command() {
        let spec = phase_command("make", BuildPhase::Clean, &project(), "");
        assert_eq!(spec.display(), "make clean APP=/p/proj/");
        assert_eq!(spec.working_dir, PathBuf::from("/p/proj/"));
    }

    #[test]
    fn test_verify_command() {
        let spec = phase_command("make", BuildPhase::Verify, &project(), "");
        assert_eq!(spec.display(), "make app APP=/p/proj/ PROJECT_NAME=proj");
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_upload_command() {
        let spec = phase_command("make", BuildPhase::Upload, &project(), "ttyACM0");
        assert_eq!(
            spec.display(),
            "make upload PORT=/dev/ttyACM0 FILE=/p/proj/bin/proj.bin"
        );
    }
}
