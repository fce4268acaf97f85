// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the managed command with `tokio::process::Command` and
//! reports its exit back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`backend`] provides the `ProcessBackend` trait and the concrete
//!   `RealProcessBackend` used in production, which tests replace with a
//!   fake implementation.
//! - [`task_runner`] owns a single child until it exits, delivering signals
//!   and kills on request.

pub mod backend;
pub mod task_runner;

pub use backend::{ProcessBackend, RealProcessBackend, PATHS_ENV};
pub use task_runner::ChildControl;
