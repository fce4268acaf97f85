// src/supervisor/mod.rs

//! Lifecycle vocabulary for the managed child process.
//!
//! The state machine itself lives in [`crate::engine::core`]; this module
//! defines the states, exit outcomes and the restart policy it consults.

use std::fmt;
use std::process::ExitStatus;

pub mod policy;

pub use policy::{exit_report, RestartPolicy};

/// Lifecycle state of the managed child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No child is running.
    Dead,
    /// A child is running and has not been signalled.
    Running,
    /// The shutdown signal has been sent; waiting for the child to exit.
    Terminating,
    /// The reload signal has been sent; the child may or may not exit.
    Reloading,
}

impl SupervisorState {
    /// True while a child process exists.
    pub fn has_child(self) -> bool {
        !matches!(self, SupervisorState::Dead)
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Dead => "dead",
            SupervisorState::Running => "running",
            SupervisorState::Terminating => "terminating",
            SupervisorState::Reloading => "reloading",
        };
        f.write_str(s)
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Code(i32),
    Signal(i32),
}

impl ExitOutcome {
    pub fn is_signal(self) -> bool {
        matches!(self, ExitOutcome::Signal(_))
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signal(signal);
            }
        }
        ExitOutcome::Code(status.code().unwrap_or(1))
    }
}
