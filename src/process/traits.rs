/*!
 * Process Control Traits
 * Platform-capability seam between the core and the kernel primitives
 */

use super::spawn::{SpawnedProcess, SpawnedThread};
use super::types::{Liveness, SignalError, WorkPlan};
use crate::core::errors::Result;
use crate::core::types::Pid;
use nix::sys::signal::Signal;

/// Process control primitives
///
/// Callers depend only on this trait; `LinuxControl` provides the
/// implementation on Linux-style kernels and tests substitute mocks.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessControl {
    /// Duplicate the caller; the duplicate runs `work` and exits
    fn spawn_process(&self, work: WorkPlan) -> Result<SpawnedProcess>;

    /// Start an execution unit sharing the caller's address space
    fn spawn_thread(&self, work: WorkPlan) -> Result<SpawnedThread>;

    /// Deliver `signal` to `pid`
    fn send_signal(&self, pid: Pid, signal: Signal) -> std::result::Result<(), SignalError>;

    /// Existence check via signal 0; nothing is delivered
    fn probe_liveness(&self, pid: Pid) -> std::result::Result<Liveness, SignalError>;
}

impl<C: ProcessControl + ?Sized> ProcessControl for &C {
    fn spawn_process(&self, work: WorkPlan) -> Result<SpawnedProcess> {
        (**self).spawn_process(work)
    }

    fn spawn_thread(&self, work: WorkPlan) -> Result<SpawnedThread> {
        (**self).spawn_thread(work)
    }

    fn send_signal(&self, pid: Pid, signal: Signal) -> std::result::Result<(), SignalError> {
        (**self).send_signal(pid, signal)
    }

    fn probe_liveness(&self, pid: Pid) -> std::result::Result<Liveness, SignalError> {
        (**self).probe_liveness(pid)
    }
}
