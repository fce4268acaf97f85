// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated supervisor state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the channel
//! - spawning, signalling and killing processes through a backend
//! - running the kill-timeout timer
//!
//! The core has no channels, no Tokio types and performs no IO, so every
//! lifecycle rule can be unit tested directly.

use std::collections::BTreeSet;

use crate::engine::event_handlers::{
    handle_child_exit, handle_kill_timeout, handle_run_request, handle_shutdown,
    handle_spawn_failure, CoreStep, Supervision,
};
use crate::engine::RuntimeEvent;
use crate::supervisor::{RestartPolicy, SupervisorState};

#[derive(Debug)]
pub struct CoreRuntime {
    sup: Supervision,
}

impl CoreRuntime {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            sup: Supervision::new(policy),
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.sup.state
    }

    /// Incarnation number of the current (or last) child; 0 before the first
    /// spawn.
    pub fn incarnation(&self) -> u64 {
        self.sup.incarnation
    }

    pub fn pending_paths(&self) -> &BTreeSet<String> {
        &self.sup.pending_paths
    }

    pub fn is_shutting_down(&self) -> bool {
        self.sup.shutting_down
    }

    pub fn policy(&self) -> &RestartPolicy {
        &self.sup.policy
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::RunRequested { paths, reason } => {
                handle_run_request(&mut self.sup, paths, reason)
            }
            RuntimeEvent::ChildExited { incarnation, exit } => {
                handle_child_exit(&mut self.sup, incarnation, exit)
            }
            RuntimeEvent::SpawnFailed { incarnation, error } => {
                handle_spawn_failure(&mut self.sup, incarnation, error)
            }
            RuntimeEvent::KillTimerElapsed { incarnation } => {
                handle_kill_timeout(&mut self.sup, incarnation)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&mut self.sup),
        }
    }
}
