// crates/test-utils/src/builders.rs

#![allow(dead_code)]

use std::time::Duration;

use watchy::config::{Config, RawConfigFile};
use watchy::supervisor::RestartPolicy;
use watchy::types::SignalName;

/// Builder for `Config` to simplify test setup.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new(command: &[&str]) -> Self {
        let mut config = RawConfigFile::default();
        config.process.command = command.iter().map(|s| s.to_string()).collect();
        Self { config }
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.config.watch.patterns.push(pattern.to_string());
        self
    }

    pub fn debounce(mut self, seconds: f64) -> Self {
        self.config.watch.debounce = Some(seconds);
        self
    }

    pub fn reconcile_interval(mut self, seconds: f64) -> Self {
        self.config.watch.reconcile_interval = Some(seconds);
        self
    }

    pub fn keep_alive(mut self, val: bool) -> Self {
        self.config.process.keep_alive = Some(val);
        self
    }

    pub fn restart_after_signal(mut self, val: bool) -> Self {
        self.config.process.restart_after_signal = Some(val);
        self
    }

    pub fn reload_signal(mut self, signal: &str) -> Self {
        self.config.process.reload_signal = Some(signal.to_string());
        self
    }

    pub fn kill_timeout(mut self, seconds: f64) -> Self {
        self.config.process.kill_timeout = Some(seconds);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> Config {
        Config::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `RestartPolicy`.
pub struct PolicyBuilder {
    policy: RestartPolicy,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self {
            policy: RestartPolicy::default(),
        }
    }

    pub fn keep_alive(mut self, val: bool) -> Self {
        self.policy.keep_alive = val;
        self
    }

    pub fn restart_after_signal(mut self, val: bool) -> Self {
        self.policy.restart_after_signal = val;
        self
    }

    pub fn reload_signal(mut self, name: &str) -> Self {
        self.policy.reload_signal = Some(name.parse::<SignalName>().expect("valid signal"));
        self
    }

    pub fn upgrade(mut self, val: bool) -> Self {
        self.policy.upgrade = val;
        self
    }

    pub fn kill_timeout(mut self, after: Duration) -> Self {
        self.policy.kill_timeout = Some(after);
        self
    }

    pub fn build(self) -> RestartPolicy {
        self.policy
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
