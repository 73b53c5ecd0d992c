/*!
 * Spawned Execution Units
 * Owned handles for forked processes and cloned threads
 *
 * A cloned unit runs on memory owned by its handle: the stack and the
 * argument bundle are released only after the unit has been waited for.
 * Dropping an unjoined handle joins first.
 */

use super::types::{ExitReport, WorkPlan};
use crate::core::errors::{ProcError, Result};
use crate::core::limits::{MIN_THREAD_STACK_SIZE, THREAD_MESSAGE_BUFFER};
use crate::core::types::Pid;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid as NixPid;
use std::fmt::{self, Write as _};
use std::os::fd::BorrowedFd;
use tracing::{debug, warn};

// =============================================================================
// STACK
// =============================================================================

/// Heap-backed stack for a cloned execution unit
pub struct ThreadStack {
    memory: Option<Box<[u8]>>,
}

impl ThreadStack {
    /// Allocate `size` bytes, failing instead of aborting when memory is short
    pub fn allocate(size: usize) -> Result<Self> {
        if size < MIN_THREAD_STACK_SIZE {
            return Err(ProcError::SpawnFailed(
                format!("stack of {} bytes is below the {} byte minimum", size, MIN_THREAD_STACK_SIZE)
                    .into(),
            ));
        }

        let mut memory = Vec::new();
        memory.try_reserve_exact(size).map_err(|e| {
            ProcError::SpawnFailed(format!("cannot allocate thread stack: {}", e).into())
        })?;
        memory.resize(size, 0u8);

        Ok(Self {
            memory: Some(memory.into_boxed_slice()),
        })
    }

    pub fn len(&self) -> usize {
        self.memory.as_ref().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 16-byte aligned address one past the top of the stack (stacks grow down)
    pub(crate) fn top(&mut self) -> Option<*mut u8> {
        let memory = self.memory.as_mut()?;
        let end = memory.as_mut_ptr_range().end;
        let misalignment = end as usize % 16;
        // SAFETY: stays within the allocation; misalignment < 16 <= len
        Some(unsafe { end.sub(misalignment) })
    }

    /// Give up the memory without freeing it
    ///
    /// Used when a unit's termination cannot be confirmed; it may still be
    /// running on this stack.
    fn leak(&mut self) {
        if let Some(memory) = self.memory.take() {
            let _ = Box::leak(memory);
        }
    }
}

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Argument bundle handed to a cloned unit at creation
///
/// The unit has exclusive use of it until it exits; the spawning side
/// only frees it after join.
#[derive(Debug, Clone, Copy)]
pub struct ThreadArgs {
    pub unit_id: u32,
    pub work: WorkPlan,
}

// =============================================================================
// HANDLES
// =============================================================================

/// Handle to a forked child process
#[derive(Debug)]
pub struct SpawnedProcess {
    pid: Pid,
    reaped: bool,
}

impl SpawnedProcess {
    pub(crate) fn new(pid: Pid) -> Self {
        Self { pid, reaped: false }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Block until the child exits and collect its status
    pub fn wait(mut self) -> Result<ExitReport> {
        let report = wait_for(self.pid, None).map_err(|e| {
            ProcError::SpawnFailed(format!("waitpid({}) failed: {}", self.pid, e.desc()).into())
        })?;
        self.reaped = true;
        debug!(pid = self.pid, status = %report, "Child process reaped");
        Ok(report)
    }
}

impl Drop for SpawnedProcess {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        // Reap if already finished; a running child is left to the caller's session
        match waitpid(NixPid::from_raw(self.pid as i32), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {
                debug!(pid = self.pid, "Dropping handle of a running child process");
            }
            Ok(_) => debug!(pid = self.pid, "Reaped child process on drop"),
            Err(e) => debug!(pid = self.pid, error = %e, "Child process already reaped"),
        }
    }
}

/// Handle to a cloned execution unit that owns the unit's stack and arguments
pub struct SpawnedThread {
    tid: Pid,
    stack: ThreadStack,
    args: Option<Box<ThreadArgs>>,
    joined: bool,
}

impl SpawnedThread {
    pub(crate) fn new(tid: Pid, stack: ThreadStack, args: Box<ThreadArgs>) -> Self {
        Self {
            tid,
            stack,
            args: Some(args),
            joined: false,
        }
    }

    pub fn tid(&self) -> Pid {
        self.tid
    }

    pub fn stack_size(&self) -> usize {
        self.stack.len()
    }

    /// Wait for the unit to exit, then release its stack and arguments
    pub fn join(mut self) -> Result<ExitReport> {
        let report = self.wait_unit();
        self.joined = true;
        report
    }

    fn wait_unit(&mut self) -> Result<ExitReport> {
        match wait_for(self.tid, Some(WaitPidFlag::__WALL)) {
            Ok(report) => {
                debug!(tid = self.tid, status = %report, "Thread joined");
                Ok(report)
            }
            Err(e) => {
                // Cannot prove the unit stopped using this memory
                warn!(tid = self.tid, error = %e, "Thread join failed, leaking its stack");
                self.stack.leak();
                if let Some(args) = self.args.take() {
                    let _ = Box::leak(args);
                }
                Err(ProcError::SpawnFailed(
                    format!("waitpid({}) failed: {}", self.tid, e.desc()).into(),
                ))
            }
        }
    }
}

impl Drop for SpawnedThread {
    fn drop(&mut self) {
        if !self.joined {
            let _ = self.wait_unit();
        }
    }
}

impl fmt::Debug for SpawnedThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedThread")
            .field("tid", &self.tid)
            .field("stack_size", &self.stack.len())
            .field("joined", &self.joined)
            .finish()
    }
}

/// waitpid until the target has exited or was killed, retrying on EINTR
fn wait_for(pid: Pid, flags: Option<WaitPidFlag>) -> nix::Result<ExitReport> {
    let target = NixPid::from_raw(pid as i32);
    loop {
        match waitpid(target, flags) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitReport::exited(pid, code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(ExitReport::signaled(pid, signal))
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}

// =============================================================================
// WORK ROUTINES
// =============================================================================

/// Fixed-capacity text buffer; cloned units share the allocator and must not allocate
pub(crate) struct MessageBuf {
    bytes: [u8; THREAD_MESSAGE_BUFFER],
    len: usize,
}

impl MessageBuf {
    pub(crate) const fn new() -> Self {
        Self {
            bytes: [0u8; THREAD_MESSAGE_BUFFER],
            len: 0,
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl fmt::Write for MessageBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.bytes.len() - self.len;
        let take = s.len().min(room);
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

/// Format a line and write it to stdout with one write(2), bypassing std's locked handle
pub(crate) fn emit(args: fmt::Arguments<'_>) {
    let mut line = MessageBuf::new();
    let _ = line.write_fmt(args);
    let _ = line.write_char('\n');
    // SAFETY: fd 1 stays open for the life of the process
    let stdout = unsafe { BorrowedFd::borrow_raw(nix::libc::STDOUT_FILENO) };
    let _ = nix::unistd::write(stdout, line.as_bytes());
}

/// Body of a forked child; the caller `_exit`s afterwards
pub(crate) fn run_process_work(work: WorkPlan) {
    let pid = nix::unistd::getpid();
    emit(format_args!(
        "Child process created! PID: {}, PPID: {}",
        pid,
        nix::unistd::getppid()
    ));

    for step in 1..=work.steps {
        emit(format_args!(
            "Child process {} working... ({}/{})",
            pid, step, work.steps
        ));
        std::thread::sleep(work.interval);
    }

    emit(format_args!("Child process {} exiting...", pid));
}

/// Body of a cloned unit
pub(crate) fn run_thread_work(args: &ThreadArgs) {
    let tid = nix::unistd::gettid();
    emit(format_args!(
        "Thread {} created! TID: {}, PID: {}",
        args.unit_id,
        tid,
        nix::unistd::getpid()
    ));

    for step in 1..=args.work.steps {
        emit(format_args!(
            "Thread {} working... ({}/{})",
            tid, step, args.work.steps
        ));
        std::thread::sleep(args.work.interval);
    }

    emit(format_args!("Thread {} finishing...", tid));
}
