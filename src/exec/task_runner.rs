// src/exec/task_runner.rs

//! Per-child process runner.

use nix::sys::signal::kill;
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::RuntimeEvent;
use crate::supervisor::ExitOutcome;
use crate::types::SignalName;

/// Request delivered to the task that owns a child.
#[derive(Debug, Clone, Copy)]
pub enum ChildControl {
    Signal(SignalName),
    Kill,
}

/// Own `child` until it exits, applying control requests as they arrive,
/// then report `ChildExited` for `incarnation`.
///
/// Signals are only ever delivered while the child is unreaped, so a pid
/// can never be signalled after it has been recycled.
pub async fn supervise_child(
    incarnation: u64,
    mut child: Child,
    mut control_rx: mpsc::UnboundedReceiver<ChildControl>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let pid = child.id();
    debug!(incarnation, ?pid, "child started");

    let exit = loop {
        tokio::select! {
            status = child.wait() => {
                break match status {
                    Ok(status) => ExitOutcome::from(status),
                    Err(err) => {
                        warn!(incarnation, error = %err, "failed waiting for child");
                        ExitOutcome::Code(1)
                    }
                };
            }

            Some(request) = control_rx.recv() => match request {
                ChildControl::Signal(signal) => {
                    if let Some(pid) = child.id() {
                        if let Err(err) = kill(Pid::from_raw(pid as i32), signal.signal()) {
                            warn!(incarnation, %signal, error = %err, "failed to signal child");
                        }
                    }
                }
                ChildControl::Kill => {
                    if let Err(err) = child.start_kill() {
                        warn!(incarnation, error = %err, "failed to kill child");
                    }
                }
            },
        }
    };

    debug!(incarnation, ?exit, "child exited");
    let _ = runtime_tx
        .send(RuntimeEvent::ChildExited { incarnation, exit })
        .await;
}
