/*!
 * Linux Process Control
 * `ProcessControl` backed by fork(2), clone(2) and kill(2) through nix
 */

use super::spawn::{run_process_work, run_thread_work, SpawnedProcess, SpawnedThread, ThreadArgs, ThreadStack};
use super::traits::ProcessControl;
use super::types::{Liveness, SignalError, WorkPlan};
use crate::core::errors::{ProcError, Result};
use crate::core::limits::DEFAULT_THREAD_STACK_SIZE;
use crate::core::types::{to_raw_pid, Pid};
use nix::errno::Errno;
use nix::libc::{c_int, c_void};
use nix::sched::CloneFlags;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{fork, ForkResult, Pid as NixPid};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, error, info};

/// Sequence number shown in a cloned unit's greeting
static NEXT_UNIT_ID: AtomicU32 = AtomicU32::new(1);

/// Process control on Linux-style kernels
#[derive(Debug, Clone)]
pub struct LinuxControl {
    stack_size: usize,
}

impl LinuxControl {
    pub fn new() -> Self {
        Self::with_stack_size(DEFAULT_THREAD_STACK_SIZE)
    }

    /// Use `stack_size` bytes of stack for every cloned unit
    pub fn with_stack_size(stack_size: usize) -> Self {
        Self { stack_size }
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    /// Sharing set for a cloned unit
    ///
    /// No CLONE_THREAD: the unit stays waitable, so its stack can be
    /// released at a known point.
    fn clone_flags() -> CloneFlags {
        CloneFlags::CLONE_VM
            | CloneFlags::CLONE_FS
            | CloneFlags::CLONE_FILES
            | CloneFlags::CLONE_SIGHAND
            | CloneFlags::CLONE_SYSVSEM
    }
}

impl Default for LinuxControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point of a cloned unit
///
/// `arg` points at the `ThreadArgs` owned by the unit's `SpawnedThread`,
/// which outlives the unit.
extern "C" fn unit_entry(arg: *mut c_void) -> c_int {
    // SAFETY: see above; the spawning side never writes to it afterwards
    let args = unsafe { &*(arg as *const ThreadArgs) };
    run_thread_work(args);
    0
}

impl ProcessControl for LinuxControl {
    fn spawn_process(&self, work: WorkPlan) -> Result<SpawnedProcess> {
        // SAFETY: the child only formats into stack buffers, writes to fd 1,
        // sleeps and leaves through _exit without running destructors
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                let pid = child.as_raw() as Pid;
                info!(pid, steps = work.steps, "Spawned child process");
                Ok(SpawnedProcess::new(pid))
            }
            Ok(ForkResult::Child) => {
                run_process_work(work);
                // SAFETY: _exit(2) ends the child at once; no destructor or
                // atexit handler may touch state copied from the parent
                unsafe { nix::libc::_exit(0) }
            }
            Err(e) => {
                error!(error = %e, "fork failed");
                Err(ProcError::SpawnFailed(format!("fork: {}", e.desc()).into()))
            }
        }
    }

    fn spawn_thread(&self, work: WorkPlan) -> Result<SpawnedThread> {
        let mut stack = ThreadStack::allocate(self.stack_size)?;
        let args = Box::new(ThreadArgs {
            unit_id: NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed),
            work,
        });

        let top = stack
            .top()
            .ok_or_else(|| ProcError::SpawnFailed("thread stack unavailable".into()))?;
        let arg_ptr = &*args as *const ThreadArgs as *mut c_void;
        let flags = Self::clone_flags().bits() | Signal::SIGCHLD as c_int;

        // SAFETY: `top` is the aligned end of a live stack and `arg_ptr` a live
        // bundle; both move into the returned handle, which waits for the unit
        // before releasing them. On failure no unit exists and both drop here.
        let raw = unsafe { nix::libc::clone(unit_entry, top as *mut c_void, flags, arg_ptr) };
        let tid = Errno::result(raw).map_err(|e| {
            error!(error = %e, "clone failed");
            ProcError::SpawnFailed(format!("clone: {}", e.desc()).into())
        })?;

        let tid = tid as Pid;
        info!(tid, unit = args.unit_id, stack_size = stack.len(), "Spawned thread");
        Ok(SpawnedThread::new(tid, stack, args))
    }

    fn send_signal(&self, pid: Pid, signal: Signal) -> std::result::Result<(), SignalError> {
        let raw = to_raw_pid(pid).ok_or(SignalError::NoSuchProcess)?;
        debug!(pid, signal = signal.as_str(), "Sending signal");
        kill(NixPid::from_raw(raw), signal).map_err(SignalError::from_errno)
    }

    fn probe_liveness(&self, pid: Pid) -> std::result::Result<Liveness, SignalError> {
        let raw = to_raw_pid(pid).ok_or(SignalError::NoSuchProcess)?;
        match kill(NixPid::from_raw(raw), None) {
            Ok(()) => Ok(Liveness::Alive),
            Err(Errno::ESRCH) => Ok(Liveness::Gone),
            // Permission checks only happen for existing targets
            Err(Errno::EPERM) => Ok(Liveness::Alive),
            Err(e) => Err(SignalError::Rejected(e)),
        }
    }
}
