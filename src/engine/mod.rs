// src/engine/mod.rs

//! Orchestration engine for watchy.
//!
//! This module ties together:
//! - run requests from the change detector, the manual restart trigger and
//!   the initial spawn
//! - exits of the managed child
//! - kill-timeout expiry
//! - shutdown signals
//!
//! The pure supervisor state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]; the sources of external requests are in
//! [`triggers`].

use crate::supervisor::ExitOutcome;

/// Why a run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The initial spawn at startup.
    Startup,
    /// A debounced batch of file changes.
    FileWatch,
    /// The manual restart line was read from stdin.
    Manual,
}

/// Events flowing into the runtime from the detector, the process backend,
/// timers and signal listeners.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Start the child, or restart/reload it if one is running.
    RunRequested {
        paths: Vec<String>,
        reason: TriggerReason,
    },
    /// The child of the given incarnation has been reaped.
    ChildExited { incarnation: u64, exit: ExitOutcome },
    /// The child of the given incarnation could not be started.
    SpawnFailed { incarnation: u64, error: String },
    /// The kill timeout for the given incarnation ran out.
    KillTimerElapsed { incarnation: u64 },
    /// Graceful shutdown requested (SIGINT / SIGTERM).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod triggers;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
