/*!
 * Process Types
 * Policies, outcomes and results for process control
 */

use crate::core::errors::ProcError;
use crate::core::inline_string::InlineString;
use crate::core::limits::{DEFAULT_GRACE_PERIOD, DEFAULT_RETRY_DELAY, DEFAULT_SEND_RETRIES};
use crate::core::types::Pid;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a signal could not be sent
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// ESRCH: no process has this id
    #[error("no such process")]
    NoSuchProcess,

    /// Any other rejection (EPERM, EINVAL, ...)
    #[error("{0}")]
    Rejected(Errno),
}

impl SignalError {
    pub fn from_errno(errno: Errno) -> Self {
        match errno {
            Errno::ESRCH => SignalError::NoSuchProcess,
            other => SignalError::Rejected(other),
        }
    }
}

/// Result of a liveness probe (signal 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Alive,
    Gone,
}

/// How a termination attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// Target exited within the grace period after the graceful signal
    ConfirmedGraceful,
    /// Target outlived the grace period and the forceful signal was accepted
    ConfirmedForced,
    /// No process had the requested id
    TargetNotFound,
    /// The kernel rejected a signal for a reason other than a missing target
    SignalSendFailed {
        signal: InlineString,
        reason: InlineString,
    },
}

impl TerminationOutcome {
    pub(crate) fn send_failed(signal: &str, errno: Errno) -> Self {
        TerminationOutcome::SignalSendFailed {
            signal: signal.into(),
            reason: errno.desc().into(),
        }
    }

    /// Whether the target is known to be gone
    pub fn is_terminated(&self) -> bool {
        matches!(
            self,
            TerminationOutcome::ConfirmedGraceful | TerminationOutcome::ConfirmedForced
        )
    }

    /// The error to surface for unsuccessful outcomes
    pub fn into_error(self, pid: Pid) -> Option<ProcError> {
        match self {
            TerminationOutcome::ConfirmedGraceful | TerminationOutcome::ConfirmedForced => None,
            TerminationOutcome::TargetNotFound => Some(ProcError::TargetNotFound(pid)),
            TerminationOutcome::SignalSendFailed { signal, reason } => {
                Some(ProcError::SignalDeliveryFailed {
                    pid,
                    signal,
                    reason,
                })
            }
        }
    }

    /// Short tag used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationOutcome::ConfirmedGraceful => "confirmed_graceful",
            TerminationOutcome::ConfirmedForced => "confirmed_forced",
            TerminationOutcome::TargetNotFound => "target_not_found",
            TerminationOutcome::SignalSendFailed { .. } => "signal_send_failed",
        }
    }
}

impl fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationOutcome::ConfirmedGraceful => write!(f, "terminated gracefully"),
            TerminationOutcome::ConfirmedForced => write!(f, "killed after grace period"),
            TerminationOutcome::TargetNotFound => write!(f, "process not found"),
            TerminationOutcome::SignalSendFailed { signal, reason } => {
                write!(f, "failed to send {}: {}", signal, reason)
            }
        }
    }
}

/// Timing and retry settings of the termination protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    /// Wait between the graceful signal and the liveness probe
    pub grace_period: Duration,
    /// Extra attempts for a send rejected with anything but ESRCH
    pub send_retries: u32,
    pub retry_delay: Duration,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            send_retries: DEFAULT_SEND_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl TerminationPolicy {
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_retries(mut self, send_retries: u32, retry_delay: Duration) -> Self {
        self.send_retries = send_retries;
        self.retry_delay = retry_delay;
        self
    }
}

/// Simulated work a spawned process or thread performs before exiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPlan {
    pub steps: u32,
    pub interval: Duration,
}

impl WorkPlan {
    pub const fn new(steps: u32, interval: Duration) -> Self {
        Self { steps, interval }
    }
}

/// How a waited-for process or thread ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub pid: Pid,
    pub code: Option<i32>,
    pub signal: Option<InlineString>,
}

impl ExitReport {
    pub fn exited(pid: Pid, code: i32) -> Self {
        Self {
            pid,
            code: Some(code),
            signal: None,
        }
    }

    pub fn signaled(pid: Pid, signal: Signal) -> Self {
        Self {
            pid,
            code: None,
            signal: Some(signal.as_str().into()),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.signal) {
            (Some(code), _) => write!(f, "exited with status {}", code),
            (None, Some(signal)) => write!(f, "killed by {}", signal),
            (None, None) => write!(f, "ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_error_from_errno() {
        assert_eq!(SignalError::from_errno(Errno::ESRCH), SignalError::NoSuchProcess);
        assert_eq!(
            SignalError::from_errno(Errno::EPERM),
            SignalError::Rejected(Errno::EPERM)
        );
    }

    #[test]
    fn test_outcome_into_error() {
        assert_eq!(TerminationOutcome::ConfirmedGraceful.into_error(5), None);
        assert_eq!(TerminationOutcome::ConfirmedForced.into_error(5), None);
        assert_eq!(
            TerminationOutcome::TargetNotFound.into_error(5),
            Some(ProcError::TargetNotFound(5))
        );

        let failed = TerminationOutcome::send_failed("SIGTERM", Errno::EPERM);
        match failed.into_error(5) {
            Some(ProcError::SignalDeliveryFailed { pid, signal, .. }) => {
                assert_eq!(pid, 5);
                assert_eq!(signal, "SIGTERM");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&TerminationOutcome::ConfirmedForced).unwrap();
        assert_eq!(json, r#"{"outcome":"confirmed_forced"}"#);
    }

    #[test]
    fn test_policy_defaults() {
        let policy = TerminationPolicy::default();
        assert_eq!(policy.grace_period, Duration::from_secs(2));
        assert_eq!(policy.send_retries, 0);
    }

    #[test]
    fn test_exit_report_display() {
        assert_eq!(ExitReport::exited(3, 0).to_string(), "exited with status 0");
        assert!(ExitReport::exited(3, 0).success());
        let killed = ExitReport::signaled(3, Signal::SIGKILL);
        assert_eq!(killed.to_string(), "killed by SIGKILL");
        assert!(!killed.success());
    }
}
