/*!
 * Termination Controller
 * Graceful signal, grace period, liveness probe, forceful escalation
 *
 * ```text
 * Initial --SIGTERM ok--> AwaitingExit --sleep--> Probing --alive--> Escalating
 *    |                                               |                   |
 *  ESRCH -> TargetNotFound                  gone -> ConfirmedGraceful   SIGKILL ok -> ConfirmedForced
 *  other -> SignalSendFailed                other -> SignalSendFailed   failure    -> SignalSendFailed
 * ```
 *
 * Every state is entered at most once, so no signal is sent twice except
 * through the configured retry policy.
 */

use super::traits::ProcessControl;
use super::types::{Liveness, SignalError, TerminationOutcome, TerminationPolicy};
use crate::core::types::{to_raw_pid, Pid};
use crate::monitoring::OperationSpan;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use tracing::{debug, info, warn};

/// Name used for the liveness probe in outcomes and logs
const PROBE_SIGNAL: &str = "signal 0";

/// States of one termination run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationState {
    Initial,
    AwaitingExit,
    Probing,
    Escalating,
    Done(TerminationOutcome),
}

/// Drives the termination protocol against a `ProcessControl`
pub struct Terminator<C> {
    control: C,
    policy: TerminationPolicy,
}

impl<C: ProcessControl> Terminator<C> {
    pub fn new(control: C, policy: TerminationPolicy) -> Self {
        Self { control, policy }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn policy(&self) -> &TerminationPolicy {
        &self.policy
    }

    /// Terminate `pid`, escalating to SIGKILL if it survives the grace period
    ///
    /// Blocks the calling thread for the grace period.
    pub fn terminate(&self, pid: Pid) -> TerminationOutcome {
        let span = OperationSpan::new("terminate").with_pid(pid);
        let _entered = span.enter();

        // 0 and ids past i32::MAX address process groups, not a process
        if to_raw_pid(pid).is_none() {
            warn!(pid, "Refusing to signal an id that names no single process");
            span.record_result(TerminationOutcome::TargetNotFound.as_str());
            return TerminationOutcome::TargetNotFound;
        }

        let mut state = TerminationState::Initial;
        let outcome = loop {
            state = match state {
                TerminationState::Done(outcome) => break outcome,
                current => self.step(pid, current),
            };
        };

        info!(pid, outcome = outcome.as_str(), "Termination finished");
        span.record_result(outcome.as_str());
        outcome
    }

    /// Advance one state
    pub fn step(&self, pid: Pid, state: TerminationState) -> TerminationState {
        match state {
            TerminationState::Initial => match self.send(pid, Signal::SIGTERM) {
                Ok(()) => {
                    info!(pid, "SIGTERM sent");
                    TerminationState::AwaitingExit
                }
                Err(SignalError::NoSuchProcess) => {
                    TerminationState::Done(TerminationOutcome::TargetNotFound)
                }
                Err(SignalError::Rejected(errno)) => TerminationState::Done(
                    TerminationOutcome::send_failed(Signal::SIGTERM.as_str(), errno),
                ),
            },

            TerminationState::AwaitingExit => {
                debug!(pid, grace_ms = self.policy.grace_period.as_millis() as u64, "Waiting for exit");
                std::thread::sleep(self.policy.grace_period);
                TerminationState::Probing
            }

            TerminationState::Probing => match self.control.probe_liveness(pid) {
                Ok(Liveness::Alive) => {
                    info!(pid, "Still running after grace period, escalating");
                    TerminationState::Escalating
                }
                Ok(Liveness::Gone) | Err(SignalError::NoSuchProcess) => {
                    TerminationState::Done(TerminationOutcome::ConfirmedGraceful)
                }
                Err(SignalError::Rejected(errno)) => {
                    TerminationState::Done(TerminationOutcome::send_failed(PROBE_SIGNAL, errno))
                }
            },

            TerminationState::Escalating => match self.send(pid, Signal::SIGKILL) {
                Ok(()) => {
                    info!(pid, "SIGKILL sent");
                    TerminationState::Done(TerminationOutcome::ConfirmedForced)
                }
                Err(e) => {
                    let errno = match e {
                        SignalError::NoSuchProcess => Errno::ESRCH,
                        SignalError::Rejected(errno) => errno,
                    };
                    TerminationState::Done(TerminationOutcome::send_failed(
                        Signal::SIGKILL.as_str(),
                        errno,
                    ))
                }
            },

            done @ TerminationState::Done(_) => done,
        }
    }

    /// Send with the policy's retries; ESRCH is final and never retried
    fn send(&self, pid: Pid, signal: Signal) -> Result<(), SignalError> {
        let mut attempt = 0;
        loop {
            match self.control.send_signal(pid, signal) {
                Err(SignalError::Rejected(errno)) if attempt < self.policy.send_retries => {
                    attempt += 1;
                    warn!(
                        pid,
                        signal = signal.as_str(),
                        error = %errno,
                        attempt,
                        "Signal rejected, retrying"
                    );
                    std::thread::sleep(self.policy.retry_delay);
                }
                result => return result,
            }
        }
    }
}
