//! # Command Runner
//!
//! Spawns the external build tool for a selected target and streams its
//! standard output back to the UI.
//!
//! ## Architecture
//!
//! - Each run is an [`Execution`] identified by a monotonically increasing
//!   generation number, allocated by the caller.
//! - [`CommandRunner::spawn`] starts the child with stdout piped and hands the
//!   pipe to a tokio task (the pump, see [`pump`]).
//! - The pump never touches UI state. It sends generation-tagged
//!   [`OutputUpdate`]s through an unbounded channel; the render loop applies
//!   only updates that carry the active generation and drops the rest.
//! - Every spawn returns an [`ExecutionHandle`] that can either be abandoned
//!   (the task keeps running, its output is discarded downstream) or asked to
//!   stop (the child is killed and the task ends).
//!
//! Standard error is discarded and stdin is closed. The child inherits the
//! environment and is not killed when its handle is dropped.

pub mod pump;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Status of a command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Command is currently running
    Running,
    /// Command exited with code 0
    Succeeded,
    /// Command exited unsuccessfully. `None` when no exit code is available
    /// (killed by a signal, failed to start, or could not be waited on).
    Failed(Option<i32>),
    /// Command was killed after a stop request
    Stopped,
}

impl ExecutionStatus {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    /// Short label used in the output view title.
    pub fn label(self) -> String {
        match self {
            Self::Running => "running".to_string(),
            Self::Succeeded => "ok".to_string(),
            Self::Failed(Some(code)) => format!("exit {code}"),
            Self::Failed(None) => "failed".to_string(),
            Self::Stopped => "stopped".to_string(),
        }
    }
}

/// What happens to a still-running execution when a new one starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupersedePolicy {
    /// Leave the old process running; its output is discarded.
    #[default]
    Abandon,
    /// Kill the old process.
    Cancel,
}

/// Payload of an [`OutputUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// One line of output, or a diagnostic line produced by the pump.
    Line(String),
    /// The process finished; always the last update of a generation.
    Exited(ExecutionStatus),
}

/// A generation-tagged message from a pump to the render loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUpdate {
    pub generation: u64,
    pub kind: UpdateKind,
}

impl OutputUpdate {
    pub fn line(generation: u64, line: impl Into<String>) -> Self {
        Self {
            generation,
            kind: UpdateKind::Line(line.into()),
        }
    }

    pub fn exited(generation: u64, status: ExecutionStatus) -> Self {
        Self {
            generation,
            kind: UpdateKind::Exited(status),
        }
    }
}

pub type UpdateSender = mpsc::UnboundedSender<OutputUpdate>;
pub type UpdateReceiver = mpsc::UnboundedReceiver<OutputUpdate>;

/// Create the channel pumps use to talk to the render loop.
pub fn update_channel() -> (UpdateSender, UpdateReceiver) {
    mpsc::unbounded_channel()
}

/// Lifecycle handle for one running pump task.
#[derive(Debug)]
pub struct ExecutionHandle {
    generation: u64,
    task: JoinHandle<()>,
    stop: Option<oneshot::Sender<()>>,
}

impl ExecutionHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ask the pump to kill the child and stop. Returns `false` if a stop was
    /// already requested or the pump is gone.
    pub fn request_stop(&mut self) -> bool {
        match self.stop.take() {
            Some(stop) => stop.send(()).is_ok(),
            None => false,
        }
    }

    /// Detach from the pump. The task runs until its process exits and its
    /// remaining updates are dropped by the receiver.
    pub fn abandon(self) {
        tracing::debug!(generation = self.generation, "abandoning execution");
        drop(self.task);
    }
}

/// One run of the build tool for a target.
#[derive(Debug)]
pub struct Execution {
    pub generation: u64,
    pub target: String,
    pub status: ExecutionStatus,
    pub started_at: Instant,
    pub finished_at: Option<Instant>,
    handle: Option<ExecutionHandle>,
}

impl Execution {
    pub fn running(generation: u64, target: String, handle: ExecutionHandle) -> Self {
        Self {
            generation,
            target,
            status: ExecutionStatus::Running,
            started_at: Instant::now(),
            finished_at: None,
            handle: Some(handle),
        }
    }

    /// An execution whose process never started.
    pub fn failed_to_start(generation: u64, target: String) -> Self {
        let now = Instant::now();
        Self {
            generation,
            target,
            status: ExecutionStatus::Failed(None),
            started_at: now,
            finished_at: Some(now),
            handle: None,
        }
    }

    /// Record the terminal status reported by the pump.
    pub fn finish(&mut self, status: ExecutionStatus) {
        self.status = status;
        self.finished_at = Some(Instant::now());
    }

    /// Retire this execution according to `policy`.
    pub fn supersede(mut self, policy: SupersedePolicy) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        if policy == SupersedePolicy::Cancel && self.status.is_running() && handle.request_stop()
        {
            tracing::debug!(generation = self.generation, "requested stop");
        }
        handle.abandon();
    }

    pub fn handle(&self) -> Option<&ExecutionHandle> {
        self.handle.as_ref()
    }
}

/// Builds and spawns the external build invocation.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandRunner {
    /// `args` go before the target name; pass an empty list to make the
    /// target the sole argument.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Human-readable command line for `target`.
    pub fn describe(&self, target: &str) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(target);
        parts.join(" ")
    }

    /// Spawn the tool for `target` and start its pump.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        &self,
        generation: u64,
        target: &str,
        updates: UpdateSender,
    ) -> Result<ExecutionHandle> {
        if target.is_empty() {
            anyhow::bail!("Target name cannot be empty");
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", self.describe(target)))?;
        let stdout = child
            .stdout
            .take()
            .context("Child process has no stdout pipe")?;

        tracing::debug!(generation, command = %self.describe(target), "spawned execution");

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(pump::run(
            generation,
            child,
            stdout,
            updates,
            pump::StopSignal::new(stop_rx),
        ));

        Ok(ExecutionHandle {
            generation,
            task,
            stop: Some(stop_tx),
        })
    }
}
