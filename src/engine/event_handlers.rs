// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.
//!
//! Each handler is a transition over [`Supervision`], the mutable part of the
//! core, and returns the commands the IO shell has to carry out.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::engine::TriggerReason;
use crate::supervisor::{exit_report, ExitOutcome, RestartPolicy, SupervisorState};
use crate::types::{LogKind, SignalName};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand {
    /// Start a new child. `paths` go into its `WATCHY_PATHS`.
    Spawn { incarnation: u64, paths: Vec<String> },
    /// Deliver a signal to the running child.
    Signal { incarnation: u64, signal: SignalName },
    /// Unconditionally kill the running child.
    Kill { incarnation: u64 },
    /// Start the kill-timeout for the given child.
    ArmKillTimer { incarnation: u64, after: Duration },
    /// Drop any pending kill-timeout.
    CancelKillTimer,
    /// Emit a user-facing log line.
    Report { kind: LogKind, message: String },
    /// The child is gone and shutdown was requested.
    Exit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn proceed(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Mutable supervisor bookkeeping owned by the core.
#[derive(Debug)]
pub struct Supervision {
    pub policy: RestartPolicy,
    pub state: SupervisorState,
    /// Incarnation of the current (or most recent) child.
    pub incarnation: u64,
    /// Paths requested while a child was being torn down.
    pub pending_paths: BTreeSet<String>,
    pub kill_timer_armed: bool,
    /// Set by a terminate that must not be followed by a respawn.
    pub stay_dead: bool,
    pub shutting_down: bool,
}

impl Supervision {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            state: SupervisorState::Dead,
            incarnation: 0,
            pending_paths: BTreeSet::new(),
            kill_timer_armed: false,
            stay_dead: false,
            shutting_down: false,
        }
    }

    fn spawn(&mut self, commands: &mut Vec<CoreCommand>) {
        self.incarnation += 1;
        self.state = SupervisorState::Running;
        let paths = std::mem::take(&mut self.pending_paths).into_iter().collect();
        commands.push(CoreCommand::Spawn {
            incarnation: self.incarnation,
            paths,
        });
    }

    /// Send the shutdown signal and arm the kill timer.
    fn terminate(&mut self, stay_dead: bool, commands: &mut Vec<CoreCommand>) {
        if stay_dead {
            self.stay_dead = true;
        }
        match self.state {
            SupervisorState::Dead | SupervisorState::Terminating => return,
            SupervisorState::Running | SupervisorState::Reloading => {}
        }

        self.state = SupervisorState::Terminating;
        let signal = self.policy.shutdown_signal;
        commands.push(sending(signal));
        commands.push(CoreCommand::Signal {
            incarnation: self.incarnation,
            signal,
        });

        if let Some(after) = self.policy.kill_timeout {
            if !self.kill_timer_armed {
                self.kill_timer_armed = true;
                commands.push(CoreCommand::ArmKillTimer {
                    incarnation: self.incarnation,
                    after,
                });
            }
        }
    }

    /// Send the reload signal; the child keeps running unless it exits.
    fn reload(&mut self, signal: SignalName, commands: &mut Vec<CoreCommand>) {
        self.state = SupervisorState::Reloading;
        // A reload satisfies the requests that led to it.
        self.pending_paths.clear();
        commands.push(sending(signal));
        commands.push(CoreCommand::Signal {
            incarnation: self.incarnation,
            signal,
        });
    }

    fn disarm_kill_timer(&mut self, commands: &mut Vec<CoreCommand>) {
        if self.kill_timer_armed {
            self.kill_timer_armed = false;
            commands.push(CoreCommand::CancelKillTimer);
        }
    }

    fn is_current(&self, incarnation: u64) -> bool {
        incarnation == self.incarnation && self.state.has_child()
    }
}

fn sending(signal: SignalName) -> CoreCommand {
    CoreCommand::Report {
        kind: LogKind::Info,
        message: format!("Sending {signal}..."),
    }
}

/// Handle a request to (re)start the child.
///
/// - `Dead`: spawn right away.
/// - `Running` / `Reloading`: send the reload signal when one is configured
///   and upgrades are off, otherwise terminate; the exit then goes through
///   restart-policy evaluation.
/// - `Terminating`: nothing to do, the exit is already on its way.
///
/// Paths are remembered until the next spawn.
pub fn handle_run_request(
    sup: &mut Supervision,
    paths: Vec<String>,
    _reason: TriggerReason,
) -> CoreStep {
    let mut commands = Vec::new();
    if sup.shutting_down {
        return CoreStep::proceed(commands);
    }

    sup.pending_paths.extend(paths);

    match sup.state {
        SupervisorState::Dead => sup.spawn(&mut commands),
        SupervisorState::Running | SupervisorState::Reloading => {
            match sup.policy.reload_signal.filter(|_| sup.policy.prefers_reload()) {
                Some(signal) => sup.reload(signal, &mut commands),
                None => sup.terminate(false, &mut commands),
            }
        }
        SupervisorState::Terminating => {}
    }

    CoreStep::proceed(commands)
}

/// Handle the exit of a child and apply the restart policy.
pub fn handle_child_exit(sup: &mut Supervision, incarnation: u64, exit: ExitOutcome) -> CoreStep {
    let mut commands = Vec::new();
    if !sup.is_current(incarnation) {
        return CoreStep::proceed(commands);
    }

    let previous = sup.state;
    sup.state = SupervisorState::Dead;
    sup.disarm_kill_timer(&mut commands);

    let (kind, message) = exit_report(exit, sup.policy.shutdown_signal);
    commands.push(CoreCommand::Report { kind, message });

    if sup.shutting_down {
        commands.push(CoreCommand::Exit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }

    let solicited = matches!(
        previous,
        SupervisorState::Terminating | SupervisorState::Reloading
    );
    let restart = !sup.stay_dead && sup.policy.should_restart(exit, solicited);
    sup.stay_dead = false;

    if restart {
        sup.spawn(&mut commands);
    } else {
        sup.pending_paths.clear();
    }

    CoreStep::proceed(commands)
}

/// Handle a child that never started. No retry is attempted.
pub fn handle_spawn_failure(sup: &mut Supervision, incarnation: u64, error: String) -> CoreStep {
    let mut commands = Vec::new();
    if !sup.is_current(incarnation) {
        return CoreStep::proceed(commands);
    }

    sup.state = SupervisorState::Dead;
    sup.stay_dead = false;
    sup.pending_paths.clear();
    sup.disarm_kill_timer(&mut commands);
    commands.push(CoreCommand::Report {
        kind: LogKind::Error,
        message: format!("Spawn failed ({error})"),
    });

    if sup.shutting_down {
        commands.push(CoreCommand::Exit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }
    CoreStep::proceed(commands)
}

/// Handle expiry of the kill timeout: escalate to SIGKILL.
pub fn handle_kill_timeout(sup: &mut Supervision, incarnation: u64) -> CoreStep {
    let mut commands = Vec::new();
    if !sup.is_current(incarnation)
        || sup.state != SupervisorState::Terminating
        || !sup.kill_timer_armed
    {
        return CoreStep::proceed(commands);
    }

    sup.kill_timer_armed = false;
    let waited = sup.policy.kill_timeout.unwrap_or_default().as_secs_f64();
    commands.push(CoreCommand::Report {
        kind: LogKind::Error,
        message: format!(
            "Failed to kill with {} after {waited} seconds",
            sup.policy.shutdown_signal
        ),
    });
    commands.push(CoreCommand::Kill { incarnation });

    CoreStep::proceed(commands)
}

/// Handle a shutdown request: terminate for good, exit once the child is
/// gone. Repeated requests are ignored.
pub fn handle_shutdown(sup: &mut Supervision) -> CoreStep {
    let mut commands = Vec::new();
    if sup.shutting_down {
        return CoreStep::proceed(commands);
    }
    sup.shutting_down = true;
    sup.pending_paths.clear();

    if sup.state == SupervisorState::Dead {
        commands.push(CoreCommand::Exit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }

    sup.terminate(true, &mut commands);
    CoreStep::proceed(commands)
}
