/*!
 * System Limits and Constants
 *
 * Centralized location for buffer sizes, timing defaults and other
 * magic numbers used when talking to the proc tables and the kernel.
 */

use std::time::Duration;

// =============================================================================
// PROC TABLE
// =============================================================================

/// Default mount point of the kernel process tables
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Single-read buffer for a `stat` record (1KB)
/// Longer records are truncated and parsed best-effort
pub const RECORD_BUFFER_SIZE: usize = 1024;

/// Single-read buffer for the detailed `status` block (4KB)
pub const STATUS_BUFFER_SIZE: usize = 4096;

/// Maximum characters kept from a record's name field
pub const MAX_NAME_LEN: usize = 255;

/// Per-entry record file inside a process or task directory
pub const STAT_FILE: &str = "stat";

/// Detailed key/value status file inside a process directory
pub const STATUS_FILE: &str = "status";

/// Per-process thread directory
pub const TASK_DIR: &str = "task";

// =============================================================================
// TERMINATION
// =============================================================================

/// Time a target gets to exit after the graceful signal (2s)
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Retries for a signal send rejected for a reason other than ESRCH
/// Zero keeps the single-attempt behavior
pub const DEFAULT_SEND_RETRIES: u32 = 0;

/// Delay between retried signal sends (100ms)
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

// =============================================================================
// SPAWNED WORK
// =============================================================================

/// Simulated work iterations performed by a spawned process
pub const DEFAULT_PROCESS_WORK_STEPS: u32 = 5;

/// Simulated work iterations performed by a spawned thread
pub const DEFAULT_THREAD_WORK_STEPS: u32 = 3;

/// Sleep between simulated work iterations (1s)
pub const DEFAULT_WORK_INTERVAL: Duration = Duration::from_secs(1);

/// Stack handed to a cloned execution unit (64KB)
/// Formatting machinery in the unit needs more than a bare 8KB
pub const DEFAULT_THREAD_STACK_SIZE: usize = 64 * 1024;

/// Smallest stack accepted for a cloned unit (16KB)
pub const MIN_THREAD_STACK_SIZE: usize = 16 * 1024;

/// Output buffer used by a cloned unit; it must never allocate
pub const THREAD_MESSAGE_BUFFER: usize = 128;
