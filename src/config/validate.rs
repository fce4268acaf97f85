// src/config/validate.rs

use std::time::Duration;

use globset::Glob;

use crate::config::model::{
    Config, ProcessSection, ProcessSettings, RawConfigFile, WatchSection, WatchSettings,
    DEFAULT_DEBOUNCE, DEFAULT_RECONCILE_INTERVAL,
};
use crate::errors::{Result, WatchyError};
use crate::supervisor::RestartPolicy;
use crate::types::SignalName;

impl TryFrom<RawConfigFile> for Config {
    type Error = WatchyError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        // A missing command wins over every other problem.
        let process = validate_process(raw.process)?;
        let watch = validate_watch(raw.watch)?;
        Ok(Config { watch, process })
    }
}

fn validate_watch(section: WatchSection) -> Result<WatchSettings> {
    for pattern in &section.patterns {
        if pattern.trim().is_empty() {
            return Err(WatchyError::ConfigError(
                "watch patterns must not be empty".to_string(),
            ));
        }
        Glob::new(pattern).map_err(|source| WatchyError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }

    let debounce = match section.debounce {
        Some(secs) => seconds("debounce", secs)?,
        None => DEFAULT_DEBOUNCE,
    };

    let reconcile_interval = match section.reconcile_interval {
        Some(secs) => positive_seconds("reconcile_interval", secs)?,
        None => DEFAULT_RECONCILE_INTERVAL,
    };

    Ok(WatchSettings {
        patterns: section.patterns,
        debounce,
        reconcile_interval,
        use_polling: section.use_polling.unwrap_or(false),
    })
}

fn validate_process(section: ProcessSection) -> Result<ProcessSettings> {
    let mut command = section.command.into_iter();
    let program = match command.next() {
        Some(p) if !p.trim().is_empty() => p,
        _ => return Err(WatchyError::MissingCommand),
    };
    let args: Vec<String> = command.collect();

    let shutdown_signal = match section.shutdown_signal.as_deref() {
        Some(name) => parse_signal(name)?,
        None => SignalName::default(),
    };
    let reload_signal = section
        .reload_signal
        .as_deref()
        .map(parse_signal)
        .transpose()?;

    // Zero disables the SIGKILL escalation.
    let kill_timeout = section
        .kill_timeout
        .map(|secs| seconds("kill_timeout", secs))
        .transpose()?
        .filter(|wait| !wait.is_zero());

    if let Some(trigger) = &section.restart_trigger {
        if trigger.trim().is_empty() {
            return Err(WatchyError::ConfigError(
                "restart trigger must not be blank".to_string(),
            ));
        }
    }

    let policy = RestartPolicy {
        keep_alive: section.keep_alive.unwrap_or(false),
        restart_after_signal: section.restart_after_signal.unwrap_or(true),
        shutdown_signal,
        reload_signal,
        upgrade: section.upgrade.unwrap_or(false),
        kill_timeout,
    };

    Ok(ProcessSettings {
        command: program,
        args,
        policy,
        init_spawn: section.init_spawn.unwrap_or(true),
        restart_trigger: section.restart_trigger.map(|t| t.trim().to_string()),
    })
}

fn parse_signal(name: &str) -> Result<SignalName> {
    name.parse::<SignalName>()
        .map_err(|_| WatchyError::InvalidSignal(name.to_string()))
}

fn seconds(field: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        WatchyError::ConfigError(format!(
            "{field} must be a finite, non-negative number of seconds (got {secs})"
        ))
    })
}

fn positive_seconds(field: &str, secs: f64) -> Result<Duration> {
    let duration = seconds(field, secs)?;
    if duration.is_zero() {
        return Err(WatchyError::ConfigError(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    fn raw_with_command(command: &[&str]) -> RawConfigFile {
        RawConfigFile {
            watch: WatchSection::default(),
            process: ProcessSection {
                command: command.iter().map(|s| s.to_string()).collect(),
                ..ProcessSection::default()
            },
        }
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = Config::try_from(raw_with_command(&["node", "app.js"])).unwrap();
        assert_eq!(cfg.process.command, "node");
        assert_eq!(cfg.process.args, vec!["app.js"]);
        assert!(cfg.process.init_spawn);
        assert!(!cfg.process.policy.keep_alive);
        assert!(cfg.process.policy.restart_after_signal);
        assert_eq!(cfg.process.policy.shutdown_signal.signal(), Signal::SIGTERM);
        assert!(cfg.process.policy.reload_signal.is_none());
        assert!(cfg.process.policy.kill_timeout.is_none());
        assert_eq!(cfg.watch.debounce, Duration::from_millis(100));
        assert_eq!(cfg.watch.reconcile_interval, Duration::from_secs(5));
    }

    #[test]
    fn missing_command_is_reported() {
        let err = Config::try_from(RawConfigFile::default()).unwrap_err();
        assert!(matches!(err, WatchyError::MissingCommand));
    }

    #[test]
    fn bad_signal_is_reported() {
        let mut raw = raw_with_command(&["true"]);
        raw.process.reload_signal = Some("SIGWAT".to_string());
        let err = Config::try_from(raw).unwrap_err();
        assert!(matches!(err, WatchyError::InvalidSignal(ref s) if s == "SIGWAT"));
    }

    #[test]
    fn zero_kill_timeout_disables_escalation() {
        let mut raw = raw_with_command(&["true"]);
        raw.process.kill_timeout = Some(0.0);
        let cfg = Config::try_from(raw).unwrap();
        assert!(cfg.process.policy.kill_timeout.is_none());

        let mut raw = raw_with_command(&["true"]);
        raw.process.kill_timeout = Some(-1.0);
        assert!(matches!(
            Config::try_from(raw),
            Err(WatchyError::ConfigError(_))
        ));
    }

    #[test]
    fn missing_command_beats_a_bad_pattern() {
        let mut raw = RawConfigFile::default();
        raw.watch.patterns = vec!["src/[abc.js".to_string()];
        assert!(matches!(
            Config::try_from(raw),
            Err(WatchyError::MissingCommand)
        ));
    }

    #[test]
    fn negative_debounce_is_rejected() {
        let mut raw = raw_with_command(&["true"]);
        raw.watch.debounce = Some(-1.0);
        assert!(matches!(
            Config::try_from(raw),
            Err(WatchyError::ConfigError(_))
        ));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let mut raw = raw_with_command(&["true"]);
        raw.watch.patterns = vec!["src/[abc.js".to_string()];
        assert!(matches!(
            Config::try_from(raw),
            Err(WatchyError::InvalidPattern { .. })
        ));
    }
}
