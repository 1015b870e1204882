//! Output pump: forwards a child's stdout to the render loop line by line.

use std::process::ExitStatus;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tokio::sync::oneshot;

use super::{ExecutionStatus, OutputUpdate, UpdateKind, UpdateSender};

/// Why [`forward_lines`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Eof,
    /// A read failed; one diagnostic line was sent.
    ReadError,
    /// A stop was requested.
    Stopped,
    /// The receiver is gone.
    Disconnected,
}

/// Stop request from an [`ExecutionHandle`](super::ExecutionHandle).
///
/// Dropping the sending side means "abandoned", not "stop", so a closed
/// channel simply never fires.
#[derive(Debug)]
pub struct StopSignal {
    rx: oneshot::Receiver<()>,
    open: bool,
}

impl StopSignal {
    pub fn new(rx: oneshot::Receiver<()>) -> Self {
        Self { rx, open: true }
    }

    /// Resolves once a stop is requested; pends forever otherwise.
    pub async fn requested(&mut self) {
        if self.open {
            match (&mut self.rx).await {
                Ok(()) => return,
                Err(_) => self.open = false,
            }
        }
        std::future::pending::<()>().await;
    }
}

/// Pump task body: forward lines, then report how the process ended.
pub(crate) async fn run(
    generation: u64,
    mut child: Child,
    stdout: ChildStdout,
    updates: UpdateSender,
    mut stop: StopSignal,
) {
    let end = forward_lines(generation, BufReader::new(stdout), &updates, &mut stop).await;

    let status = match end {
        StreamEnd::Disconnected => {
            tracing::debug!(generation, "update receiver closed, pump exiting");
            return;
        }
        StreamEnd::Stopped => kill(generation, &mut child).await,
        StreamEnd::Eof | StreamEnd::ReadError => {
            tokio::select! {
                () = stop.requested() => kill(generation, &mut child).await,
                waited = child.wait() => status_from_wait(waited),
            }
        }
    };

    tracing::debug!(generation, status = %status.label(), "execution finished");
    let _ = updates.send(OutputUpdate::exited(generation, status));
}

/// Read `reader` line by line, sending each line tagged with `generation`.
///
/// Lines keep their emission order. Invalid UTF-8 is replaced rather than
/// treated as an error.
pub async fn forward_lines<R>(
    generation: u64,
    mut reader: R,
    updates: &UpdateSender,
    stop: &mut StopSignal,
) -> StreamEnd
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        tokio::select! {
            () = stop.requested() => return StreamEnd::Stopped,
            read = reader.read_until(b'\n', &mut buf) => match read {
                Ok(0) => return StreamEnd::Eof,
                Ok(_) => {
                    let update = OutputUpdate {
                        generation,
                        kind: UpdateKind::Line(decode_line(&buf)),
                    };
                    if updates.send(update).is_err() {
                        return StreamEnd::Disconnected;
                    }
                }
                Err(e) => {
                    tracing::debug!(generation, "read error: {e}");
                    let diagnostic = OutputUpdate::line(generation, read_error_line(&e));
                    if updates.send(diagnostic).is_err() {
                        return StreamEnd::Disconnected;
                    }
                    return StreamEnd::ReadError;
                }
            }
        }
    }
}

/// Strip the line terminator and decode lossily.
pub fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

pub fn read_error_line(err: &std::io::Error) -> String {
    format!("error reading command output: {err}")
}

async fn kill(generation: u64, child: &mut Child) -> ExecutionStatus {
    if let Err(e) = child.kill().await {
        tracing::debug!(generation, "failed to kill child: {e}");
    }
    ExecutionStatus::Stopped
}

fn status_from_wait(waited: std::io::Result<ExitStatus>) -> ExecutionStatus {
    match waited {
        Ok(status) if status.success() => ExecutionStatus::Succeeded,
        Ok(status) => ExecutionStatus::Failed(status.code()),
        Err(e) => {
            tracing::debug!("failed to wait for child: {e}");
            ExecutionStatus::Failed(None)
        }
    }
}
