// src/report.rs

//! Single reporting entry point for user-facing events.
//!
//! Every component funnels run starts, signals, escalations, exit outcomes and
//! errors through [`report`], which turns them into `tracing` events carrying a
//! `kind` field (`info`, `success` or `error`).

use std::fmt::Display;

use tracing::{error, info};

use crate::types::LogKind;

pub fn report(kind: LogKind, message: impl Display) {
    match kind {
        LogKind::Info => info!(kind = kind.as_str(), "{message}"),
        LogKind::Success => info!(kind = kind.as_str(), "{message}"),
        LogKind::Error => error!(kind = kind.as_str(), "{message}"),
    }
}

pub fn report_error(message: impl Display) {
    report(LogKind::Error, message);
}
