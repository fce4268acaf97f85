// src/supervisor/policy.rs

use std::time::Duration;

use crate::supervisor::ExitOutcome;
use crate::types::{signal_label, LogKind, SignalName};

/// When and how the child is restarted and stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartPolicy {
    /// Respawn after the child exits on its own, whatever the exit code.
    pub keep_alive: bool,
    /// Respawn after an exit that followed a signal.
    pub restart_after_signal: bool,
    /// Signal sent to stop the child.
    pub shutdown_signal: SignalName,
    /// Signal sent instead of the shutdown signal to ask for a soft reload.
    pub reload_signal: Option<SignalName>,
    /// Always terminate and respawn, even when a reload signal is set.
    pub upgrade: bool,
    /// Escalate to SIGKILL this long after the shutdown signal.
    pub kill_timeout: Option<Duration>,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            keep_alive: false,
            restart_after_signal: true,
            shutdown_signal: SignalName::default(),
            reload_signal: None,
            upgrade: false,
            kill_timeout: None,
        }
    }
}

impl RestartPolicy {
    /// Whether a run request on a live child should send the reload signal
    /// rather than terminate it.
    pub fn prefers_reload(&self) -> bool {
        self.reload_signal.is_some() && !self.upgrade
    }

    /// Decide whether to respawn after `exit`.
    ///
    /// `solicited` is true when we had signalled the child (it was
    /// terminating or reloading). An exit by signal that we did not send is
    /// governed by `restart_after_signal` alone; every other exit also
    /// restarts under `keep_alive`.
    pub fn should_restart(&self, exit: ExitOutcome, solicited: bool) -> bool {
        let signaled = solicited || exit.is_signal();
        let unsolicited_signal = exit.is_signal() && !solicited;
        (signaled && self.restart_after_signal) || (self.keep_alive && !unsolicited_signal)
    }
}

/// Log lines describing how the child exited.
///
/// A signal equal to `shutdown_signal` is expected and reported as info;
/// any other signal is an error. Code 0 is a success, anything else an
/// error.
pub fn exit_report(exit: ExitOutcome, shutdown_signal: SignalName) -> (LogKind, String) {
    match exit {
        ExitOutcome::Signal(number) => {
            let kind = if number == shutdown_signal.number() {
                LogKind::Info
            } else {
                LogKind::Error
            };
            (kind, format!("Killed with {}", signal_label(number)))
        }
        ExitOutcome::Code(0) => (LogKind::Success, "Exited cleanly".to_string()),
        ExitOutcome::Code(code) => (LogKind::Error, format!("Exited with code {code}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    fn policy(keep_alive: bool, restart_after_signal: bool) -> RestartPolicy {
        RestartPolicy {
            keep_alive,
            restart_after_signal,
            ..RestartPolicy::default()
        }
    }

    const SIGKILL: i32 = Signal::SIGKILL as i32;
    const SIGTERM: i32 = Signal::SIGTERM as i32;

    #[test]
    fn solicited_exit_restarts_when_restart_after_signal() {
        let p = policy(false, true);
        assert!(p.should_restart(ExitOutcome::Signal(SIGTERM), true));
        assert!(p.should_restart(ExitOutcome::Code(0), true));
        assert!(!p.should_restart(ExitOutcome::Code(0), false));
    }

    #[test]
    fn keep_alive_without_restart_after_signal() {
        let p = policy(true, false);
        assert!(p.should_restart(ExitOutcome::Code(0), false));
        assert!(p.should_restart(ExitOutcome::Code(3), false));
        assert!(!p.should_restart(ExitOutcome::Signal(SIGKILL), false));
        assert!(p.should_restart(ExitOutcome::Signal(SIGTERM), true));
    }

    #[test]
    fn nothing_set_never_restarts() {
        let p = policy(false, false);
        assert!(!p.should_restart(ExitOutcome::Code(2), false));
        assert!(!p.should_restart(ExitOutcome::Signal(SIGTERM), true));
        assert!(!p.should_restart(ExitOutcome::Signal(SIGKILL), false));
    }

    #[test]
    fn unsolicited_signal_restarts_by_default() {
        assert!(RestartPolicy::default().should_restart(ExitOutcome::Signal(SIGKILL), false));
    }

    #[test]
    fn exit_report_classifies_outcomes() {
        let term = SignalName::default();
        assert_eq!(
            exit_report(ExitOutcome::Code(0), term),
            (LogKind::Success, "Exited cleanly".to_string())
        );
        assert_eq!(
            exit_report(ExitOutcome::Code(2), term),
            (LogKind::Error, "Exited with code 2".to_string())
        );
        assert_eq!(
            exit_report(ExitOutcome::Signal(SIGTERM), term),
            (LogKind::Info, "Killed with SIGTERM".to_string())
        );
        assert_eq!(
            exit_report(ExitOutcome::Signal(SIGKILL), term),
            (LogKind::Error, "Killed with SIGKILL".to_string())
        );
    }

    #[test]
    fn upgrade_disables_soft_reload() {
        let mut p = RestartPolicy {
            reload_signal: Some(SignalName::new(Signal::SIGHUP)),
            ..RestartPolicy::default()
        };
        assert!(p.prefers_reload());
        p.upgrade = true;
        assert!(!p.prefers_reload());
    }
}
