//! Reusable toolchain process handles
//!
//! A handle is created once per phase and reused for every invocation. Its
//! events (started, merged output chunks, finished) are delivered on an
//! unbounded channel shared by all handles of a pipeline, in that order.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::errors::{BrewError, Result};
pub use crate::models::{ProcessEvent, ProcessEventKind};
use crate::models::{BuildPhase, ProcessState};

const READ_CHUNK_SIZE: usize = 4096;

/// How long the output readers may lag behind the process exit. Processes
/// make leaves behind can hold the pipes open indefinitely.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// A fully resolved toolchain invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Command line as shown to the user
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// One reusable subprocess slot.
///
/// `start` is rejected with [`BrewError::AlreadyRunning`] while a previous
/// invocation is still active; callers wait or kill first. A non-zero exit
/// code is data carried by the `Finished` event, not an error.
#[async_trait]
pub trait ProcessRunner: Send {
    fn phase(&self) -> BuildPhase;

    fn state(&self) -> ProcessState;

    fn start(&mut self, command: &CommandSpec) -> Result<()>;

    /// Resolve once no invocation of this handle is active
    async fn wait_for_finished(&mut self);

    /// Request termination; a no-op when nothing is running
    fn kill(&mut self);
}

/// Process handle backed by a tokio child process
pub struct MakeProcess {
    phase: BuildPhase,
    events: mpsc::UnboundedSender<ProcessEvent>,
    state: watch::Receiver<ProcessState>,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl MakeProcess {
    pub fn new(phase: BuildPhase, events: mpsc::UnboundedSender<ProcessEvent>) -> Self {
        let (_, state) = watch::channel(ProcessState::Idle);
        Self {
            phase,
            events,
            state,
            kill_tx: None,
        }
    }
}

#[async_trait]
impl ProcessRunner for MakeProcess {
    fn phase(&self) -> BuildPhase {
        self.phase
    }

    fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    fn start(&mut self, command: &CommandSpec) -> Result<()> {
        if self.state().is_active() {
            return Err(BrewError::AlreadyRunning(self.phase));
        }

        let (state_tx, state_rx) = watch::channel(ProcessState::Starting);
        self.state = state_rx;

        log::debug!("Starting {}: {}", self.phase.name(), command.display());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a kill also reaches the compilers make started
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                state_tx.send_replace(ProcessState::Finished(None));
                return Err(BrewError::Process(format!(
                    "Failed to start {}: {}",
                    command.program.display(),
                    e
                )));
            }
        };

        state_tx.send_replace(ProcessState::Running);
        let _ = self
            .events
            .send(ProcessEvent::new(self.phase, ProcessEventKind::Started));

        let phase = self.phase;
        let pid = child.id();
        let events = self.events.clone();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_output(stdout, phase, events.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_output(stderr, phase, events.clone()));
        }

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        self.kill_tx = Some(kill_tx);

        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                Ok(()) = kill_rx => {
                    log::debug!("Killing {} process", phase.name());
                    terminate(&mut child, pid, phase);
                    child.wait().await
                }
            };

            // Drain both pipes before reporting the exit, but never wait on
            // them past the grace period
            let deadline = tokio::time::Instant::now() + OUTPUT_GRACE;
            for mut reader in readers {
                if tokio::time::timeout_at(deadline, &mut reader).await.is_err() {
                    log::warn!(
                        "{} output still open after the process exited, detaching",
                        phase.name()
                    );
                    reader.abort();
                }
            }

            let code = match status {
                Ok(status) => status.code(),
                Err(e) => {
                    log::warn!("Failed to wait for {} process: {}", phase.name(), e);
                    None
                }
            };

            state_tx.send_replace(ProcessState::Finished(code));
            let _ = events.send(ProcessEvent::new(phase, ProcessEventKind::Finished(code)));
        });

        Ok(())
    }

    async fn wait_for_finished(&mut self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| !s.is_active()).await;
    }

    fn kill(&mut self) {
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }
    }
}

/// Kill the process group of `pid`, falling back to the child alone
fn terminate(child: &mut Child, pid: Option<u32>, phase: BuildPhase) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            // SAFETY: killpg only sends a signal; the group was created at spawn
            if unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } == 0 {
                return;
            }
            log::debug!(
                "Failed to kill {} process group: {}",
                phase.name(),
                std::io::Error::last_os_error()
            );
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(e) = child.start_kill() {
        log::warn!("Failed to kill {} process: {}", phase.name(), e);
    }
}

fn forward_output<R>(
    mut reader: R,
    phase: BuildPhase,
    events: mpsc::UnboundedSender<ProcessEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = ProcessEventKind::OutputChunk(buf[..n].to_vec());
                    let _ = events.send(ProcessEvent::new(phase, chunk));
                }
                Err(e) => {
                    log::warn!("Failed to read {} output: {}", phase.name(), e);
                    break;
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("/bin/sh", std::env::temp_dir())
            .arg("-c")
            .arg(script)
    }

    async fn collect(rx: &mut mpsc::UnboundedReceiver<ProcessEvent>) -> Vec<ProcessEventKind> {
        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = matches!(event.kind, ProcessEventKind::Finished(_));
            kinds.push(event.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn test_command_display() {
        let spec = CommandSpec::new("make", "/p/proj/")
            .arg("app")
            .arg("APP=/p/proj/")
            .arg("PROJECT_NAME=proj");
        assert_eq!(spec.display(), "make app APP=/p/proj/ PROJECT_NAME=proj");
    }

    #[tokio::test]
    async fn test_events_are_ordered_and_streams_merged() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut process = MakeProcess::new(BuildPhase::Verify, tx);

        process
            .start(&sh("echo compiling; echo 'main.c: error' 1>&2; exit 3"))
            .unwrap();
        let kinds = collect(&mut rx).await;

        assert_eq!(kinds.first(), Some(&ProcessEventKind::Started));
        assert_eq!(kinds.last(), Some(&ProcessEventKind::Finished(Some(3))));

        let output: Vec<u8> = kinds
            .iter()
            .filter_map(|k| match k {
                ProcessEventKind::OutputChunk(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("compiling"));
        assert!(output.contains("main.c: error"));

        assert_eq!(process.state(), ProcessState::Finished(Some(3)));
    }

    #[tokio::test]
    async fn test_start_while_running_is_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut process = MakeProcess::new(BuildPhase::Upload, tx);

        process.start(&sh("exec sleep 5")).unwrap();
        let second = process.start(&sh("true"));
        assert!(matches!(second, Err(BrewError::AlreadyRunning(BuildPhase::Upload))));

        process.kill();
        let kinds = collect(&mut rx).await;
        assert!(matches!(kinds.last(), Some(ProcessEventKind::Finished(_))));

        process.wait_for_finished().await;
        assert!(!process.state().is_active());

        // The handle is reusable once finished
        process.start(&sh("exit 0")).unwrap();
        let kinds = collect(&mut rx).await;
        assert_eq!(kinds.last(), Some(&ProcessEventKind::Finished(Some(0))));
    }

    #[tokio::test]
    async fn test_kill_reaches_children_holding_the_pipes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut process = MakeProcess::new(BuildPhase::Verify, tx);

        // The shell forks sleep, which inherits stdout and stderr
        process.start(&sh("sleep 30; echo done")).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        process.kill();

        let kinds = tokio::time::timeout(Duration::from_secs(5), collect(&mut rx))
            .await
            .expect("kill must finish the process");
        assert_eq!(kinds.last(), Some(&ProcessEventKind::Finished(None)));
        assert_eq!(process.state(), ProcessState::Finished(None));
    }

    #[tokio::test]
    async fn test_exit_is_reported_while_background_child_holds_output() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut process = MakeProcess::new(BuildPhase::Clean, tx);

        process.start(&sh("echo cleaning; sleep 10 & exit 0")).unwrap();

        let kinds = tokio::time::timeout(Duration::from_secs(3), collect(&mut rx))
            .await
            .expect("exit must be reported after the grace period");
        assert_eq!(kinds.last(), Some(&ProcessEventKind::Finished(Some(0))));
        assert!(!process.state().is_active());
    }

    #[tokio::test]
    async fn test_kill_without_process_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut process = MakeProcess::new(BuildPhase::Clean, tx);

        process.kill();
        process.wait_for_finished().await;
        assert_eq!(process.state(), ProcessState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut process = MakeProcess::new(BuildPhase::Clean, tx);

        let result = process.start(&CommandSpec::new(
            "/nonexistent/qkbrew-make",
            std::env::temp_dir(),
        ));
        assert!(matches!(result, Err(BrewError::Process(_))));
        assert!(!process.state().is_active());
    }
}
