// src/types.rs

use std::fmt;
use std::str::FromStr;

use nix::sys::signal::Signal;
use serde::Deserialize;

/// Kind of a user-facing log event.
///
/// The supervisor only ever reports three kinds of things: plain progress
/// (`Info`), a child that exited cleanly (`Success`) and anything that went
/// wrong (`Error`). `--silent` suppresses everything but `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Success,
    Error,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Success => "success",
            LogKind::Error => "error",
        }
    }
}

/// A POSIX signal named in the configuration (`SIGTERM`, `TERM`, `hup`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SignalName(Signal);

impl SignalName {
    pub fn new(signal: Signal) -> Self {
        Self(signal)
    }

    pub fn signal(self) -> Signal {
        self.0
    }

    /// Raw signal number, as reported by a child's exit status.
    pub fn number(self) -> i32 {
        self.0 as i32
    }
}

impl Default for SignalName {
    fn default() -> Self {
        SignalName(Signal::SIGTERM)
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for SignalName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if upper.is_empty() {
            return Err("empty signal name".to_string());
        }
        let full = if upper.starts_with("SIG") {
            upper
        } else {
            format!("SIG{upper}")
        };
        Signal::from_str(&full)
            .map(SignalName)
            .map_err(|_| format!("unknown signal: {}", s.trim()))
    }
}

impl TryFrom<String> for SignalName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Human-readable name for a raw signal number (falls back to the number).
pub fn signal_label(number: i32) -> String {
    match Signal::try_from(number) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("signal {number}"),
    }
}
