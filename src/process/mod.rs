/*!
 * Process Module
 * Process control primitives, spawned-unit handles and the termination protocol
 */

pub mod linux;
pub mod spawn;
pub mod termination;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use linux::LinuxControl;
pub use spawn::{SpawnedProcess, SpawnedThread, ThreadArgs, ThreadStack};
pub use termination::{TerminationState, Terminator};
pub use traits::ProcessControl;
pub use types::{
    ExitReport, Liveness, SignalError, TerminationOutcome, TerminationPolicy, WorkPlan,
};
