// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::RestartPolicy;

/// Default trailing debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default interval between reconciliation scans.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration as read from an optional TOML file, before validation.
///
/// ```toml
/// [watch]
/// patterns = ["src/**/*.js"]
/// debounce = 0.25
///
/// [process]
/// command = ["node", "server.js"]
/// keep_alive = true
/// reload_signal = "SIGHUP"
/// kill_timeout = 5
/// ```
///
/// Every field is optional; command-line flags are layered on top by
/// [`crate::config::loader::apply_cli`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub process: ProcessSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Glob patterns, relative to the working directory or absolute.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Debounce window in seconds.
    #[serde(default)]
    pub debounce: Option<f64>,

    /// Seconds between full reconciliation scans.
    #[serde(default)]
    pub reconcile_interval: Option<f64>,

    #[serde(default)]
    pub use_polling: Option<bool>,
}

/// `[process]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessSection {
    /// Program followed by its arguments.
    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub keep_alive: Option<bool>,

    #[serde(default)]
    pub restart_after_signal: Option<bool>,

    #[serde(default)]
    pub shutdown_signal: Option<String>,

    #[serde(default)]
    pub reload_signal: Option<String>,

    /// Terminate and respawn on every trigger even if `reload_signal` is set.
    #[serde(default)]
    pub upgrade: Option<bool>,

    /// Seconds to wait after the shutdown signal before sending SIGKILL.
    #[serde(default)]
    pub kill_timeout: Option<f64>,

    #[serde(default)]
    pub init_spawn: Option<bool>,

    /// Line on stdin that requests a manual restart.
    #[serde(default)]
    pub restart_trigger: Option<String>,
}

/// Validated configuration. Construct via `Config::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct Config {
    pub watch: WatchSettings,
    pub process: ProcessSettings,
}

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub patterns: Vec<String>,
    pub debounce: Duration,
    pub reconcile_interval: Duration,
    pub use_polling: bool,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            use_polling: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessSettings {
    pub command: String,
    pub args: Vec<String>,
    pub policy: RestartPolicy,
    pub init_spawn: bool,
    pub restart_trigger: Option<String>,
}

impl ProcessSettings {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            policy: RestartPolicy::default(),
            init_spawn: true,
            restart_trigger: None,
        }
    }
}
