/*!
 * Process Manager Library
 * Process and thread inspection, spawning and termination on Linux
 */

pub mod cli;
pub mod core;
pub mod monitoring;
pub mod process;
pub mod procfs;

// Re-exports
pub use crate::core::{Config, ConfigError, InlineString, ManagerError, Pid, ProcError, Result, Tid};
pub use cli::Session;
pub use monitoring::{init_tracing, OperationSpan};
pub use process::{
    ExitReport, LinuxControl, Liveness, ProcessControl, SignalError, SpawnedProcess,
    SpawnedThread, TerminationOutcome, TerminationPolicy, TerminationState, Terminator, WorkPlan,
};
pub use procfs::{ProcTable, ProcessRecord, ProcessState, Snapshot, ThreadRecord};
