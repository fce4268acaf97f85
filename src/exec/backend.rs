// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The runtime talks to a `ProcessBackend` instead of spawning processes
//! itself, so tests can swap in a fake that records spawns and signals and
//! lets the test decide when a "child" exits.
//!
//! - `RealProcessBackend` is the production implementation built on
//!   `tokio::process`.
//! - Every child is identified by the incarnation number the core assigned
//!   to it; requests for anything but the current incarnation are dropped.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::RuntimeEvent;
use crate::errors::{Result, WatchyError};
use crate::exec::task_runner::{supervise_child, ChildControl};
use crate::types::SignalName;

/// Environment variable carrying the comma-joined trigger paths.
pub const PATHS_ENV: &str = "WATCHY_PATHS";

/// Trait abstracting how the managed child is started and stopped.
pub trait ProcessBackend: Send {
    /// Start the child for `incarnation`. The backend must eventually send a
    /// `RuntimeEvent::ChildExited` for every successful spawn.
    fn spawn(
        &mut self,
        incarnation: u64,
        paths: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Deliver `signal` to the child of `incarnation`, if it is still alive.
    fn signal(&mut self, incarnation: u64, signal: SignalName);

    /// Forcefully kill the child of `incarnation`, if it is still alive.
    fn kill(&mut self, incarnation: u64);
}

/// Real backend: runs `command args...` with stdin closed and stdout/stderr
/// inherited.
pub struct RealProcessBackend {
    command: String,
    args: Vec<String>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    current: Option<(u64, mpsc::UnboundedSender<ChildControl>)>,
}

impl RealProcessBackend {
    pub fn new(command: String, args: Vec<String>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            command,
            args,
            runtime_tx,
            current: None,
        }
    }

    fn control(&self, incarnation: u64, request: ChildControl) {
        match &self.current {
            Some((current, tx)) if *current == incarnation => {
                if tx.send(request).is_err() {
                    debug!(incarnation, "child already reaped; dropping {request:?}");
                }
            }
            _ => debug!(incarnation, "no such child; dropping {request:?}"),
        }
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(
        &mut self,
        incarnation: u64,
        paths: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut cmd = Command::new(&self.command);
            cmd.args(&self.args)
                .env(PATHS_ENV, paths.join(","))
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true);

            let child = cmd.spawn().map_err(WatchyError::Spawn)?;

            let (control_tx, control_rx) = mpsc::unbounded_channel();
            self.current = Some((incarnation, control_tx));
            tokio::spawn(supervise_child(
                incarnation,
                child,
                control_rx,
                self.runtime_tx.clone(),
            ));
            Ok(())
        })
    }

    fn signal(&mut self, incarnation: u64, signal: SignalName) {
        self.control(incarnation, ChildControl::Signal(signal));
    }

    fn kill(&mut self, incarnation: u64) {
        self.control(incarnation, ChildControl::Kill);
    }
}
