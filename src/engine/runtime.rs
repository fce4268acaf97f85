// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::{Result, WatchyError};
use crate::exec::ProcessBackend;
use crate::report::report;
use crate::types::LogKind;
use crate::watch::WatchStopper;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the supervisor state machine in response to `RuntimeEvent`s and
/// delegates process handling to a `ProcessBackend`.
///
/// This is an IO shell around `CoreRuntime`, which contains all the
/// lifecycle semantics. The shell reads events, runs the commands the core
/// returns, owns the kill-timeout timer, and stops the change detector once
/// shutdown begins.
pub struct Runtime<B: ProcessBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    backend: B,
    run_label: String,
    kill_timer: Option<JoinHandle<()>>,
    watch: Option<WatchStopper>,
}

impl<B: ProcessBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("run_label", &self.run_label)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> Runtime<B> {
    /// `event_tx` must feed `event_rx`; the shell uses it for timer expiry
    /// and spawn failures.
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        backend: B,
        run_label: String,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            backend,
            run_label,
            kill_timer: None,
            watch: None,
        }
    }

    /// Stop this change detector as soon as shutdown is requested.
    pub fn with_watch(mut self, watch: WatchStopper) -> Self {
        self.watch = Some(watch);
        self
    }

    /// Main event loop. Returns once the core requests exit, which only
    /// happens after a shutdown request and with no child alive.
    pub async fn run(mut self) -> Result<()> {
        debug!("runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            if matches!(event, RuntimeEvent::ShutdownRequested) {
                self.stop_watching();
            }

            let mut step = self.core.step(event);

            // A failed spawn is fed straight back into the core before any
            // other event is looked at.
            loop {
                let mut follow_up = None;
                for command in step.commands {
                    if let Some(event) = self.execute_command(command).await {
                        follow_up = Some(event);
                    }
                }
                if !step.keep_running {
                    info!("supervisor finished; exiting");
                    self.cancel_kill_timer();
                    return Ok(());
                }
                match follow_up {
                    Some(event) => step = self.core.step(event),
                    None => break,
                }
            }
        }

        debug!("runtime event channel closed");
        Ok(())
    }

    /// Execute a single command from the core. Returns an event to feed back
    /// into the core when the command failed synchronously.
    async fn execute_command(&mut self, command: CoreCommand) -> Option<RuntimeEvent> {
        match command {
            CoreCommand::Spawn { incarnation, paths } => {
                report(LogKind::Info, &self.run_label);
                match self.backend.spawn(incarnation, paths).await {
                    Ok(()) => None,
                    Err(err) => Some(RuntimeEvent::SpawnFailed {
                        incarnation,
                        error: spawn_error_message(err),
                    }),
                }
            }
            CoreCommand::Signal {
                incarnation,
                signal,
            } => {
                self.backend.signal(incarnation, signal);
                None
            }
            CoreCommand::Kill { incarnation } => {
                self.backend.kill(incarnation);
                None
            }
            CoreCommand::ArmKillTimer { incarnation, after } => {
                self.arm_kill_timer(incarnation, after);
                None
            }
            CoreCommand::CancelKillTimer => {
                self.cancel_kill_timer();
                None
            }
            CoreCommand::Report { kind, message } => {
                report(kind, message);
                None
            }
            CoreCommand::Exit => None,
        }
    }

    fn arm_kill_timer(&mut self, incarnation: u64, after: Duration) {
        self.cancel_kill_timer();
        let tx = self.event_tx.clone();
        self.kill_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(RuntimeEvent::KillTimerElapsed { incarnation }).await;
        }));
    }

    fn cancel_kill_timer(&mut self) {
        if let Some(timer) = self.kill_timer.take() {
            timer.abort();
        }
    }

    fn stop_watching(&mut self) {
        if let Some(watch) = self.watch.take() {
            debug!("stopping change detector");
            watch.stop();
        }
    }
}

fn spawn_error_message(err: WatchyError) -> String {
    match err {
        WatchyError::Spawn(io) => io.to_string(),
        other => other.to_string(),
    }
}

/// The line logged when a child is started: the command and its arguments,
/// with arguments containing whitespace JSON-style quoted.
pub fn run_label(command: &str, args: &[String]) -> String {
    std::iter::once(command)
        .chain(args.iter().map(String::as_str))
        .map(quote_arg)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    if !arg.chars().any(char::is_whitespace) {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
