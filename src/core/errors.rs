/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::inline_string::InlineString;
use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Process table and process control errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcError {
    #[error("Cannot open directory {}: {reason}", .path.display())]
    #[diagnostic(
        code(proc::directory_unavailable),
        help("The proc table may not be mounted, or the process has exited. Check the PID and permissions.")
    )]
    DirectoryUnavailable { path: PathBuf, reason: InlineString },

    #[error("Cannot read record {}: {reason}", .path.display())]
    #[diagnostic(
        code(proc::record_unreadable),
        help("The entry probably vanished while it was being read.")
    )]
    RecordUnreadable { path: PathBuf, reason: InlineString },

    #[error("Malformed record {}: {reason}", .path.display())]
    #[diagnostic(
        code(proc::malformed_record),
        help("The record did not contain an id, a name and a state in that order.")
    )]
    MalformedRecord { path: PathBuf, reason: InlineString },

    #[error("Process {0} not found")]
    #[diagnostic(
        code(proc::target_not_found),
        help("The process may have terminated or never existed. Check PID validity.")
    )]
    TargetNotFound(Pid),

    #[error("Failed to send {signal} to process {pid}: {reason}")]
    #[diagnostic(
        code(proc::signal_delivery_failed),
        help("The kernel rejected the signal. Insufficient permissions are the usual cause.")
    )]
    SignalDeliveryFailed {
        pid: Pid,
        signal: InlineString,
        reason: InlineString,
    },

    #[error("Spawn failed: {0}")]
    #[diagnostic(
        code(proc::spawn_failed),
        help("Check system resources (process limits, memory).")
    )]
    SpawnFailed(InlineString),
}

impl ProcError {
    /// Whether this failure concerns a single table entry rather than the whole pass
    pub fn is_per_entry(&self) -> bool {
        matches!(
            self,
            ProcError::RecordUnreadable { .. } | ProcError::MalformedRecord { .. }
        )
    }
}

/// Configuration errors raised while reading the environment
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Unset the variable to fall back to the default.")
    )]
    InvalidValue {
        key: InlineString,
        value: InlineString,
        reason: InlineString,
    },
}

/// Unified error type for the binary
#[derive(Error, Debug, Diagnostic)]
pub enum ManagerError {
    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Proc(#[from] ProcError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(manager::io_error),
        help("Reading the terminal or writing output failed.")
    )]
    Io(InlineString),
}

impl From<std::io::Error> for ManagerError {
    fn from(err: std::io::Error) -> Self {
        ManagerError::Io(err.to_string().into())
    }
}

/// Result type for process table and control operations
pub type Result<T> = std::result::Result<T, ProcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proc_error_serialization() {
        let error = ProcError::TargetNotFound(123);
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: ProcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_directory_unavailable_display() {
        let error = ProcError::DirectoryUnavailable {
            path: PathBuf::from("/proc/42/task"),
            reason: "No such file or directory".into(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot open directory /proc/42/task: No such file or directory"
        );
        assert!(!error.is_per_entry());
    }

    #[test]
    fn test_per_entry_classification() {
        let unreadable = ProcError::RecordUnreadable {
            path: PathBuf::from("/proc/1/stat"),
            reason: "gone".into(),
        };
        let malformed = ProcError::MalformedRecord {
            path: PathBuf::from("/proc/1/stat"),
            reason: "missing state".into(),
        };
        assert!(unreadable.is_per_entry());
        assert!(malformed.is_per_entry());
        assert!(!ProcError::SpawnFailed("EAGAIN".into()).is_per_entry());
    }

    #[test]
    fn test_manager_error_from_proc_error() {
        let error: ManagerError = ProcError::TargetNotFound(7).into();
        assert!(matches!(error, ManagerError::Proc(ProcError::TargetNotFound(7))));
        assert_eq!(error.to_string(), "Process error: Process 7 not found");
    }

    #[test]
    fn test_manager_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let error: ManagerError = io.into();
        assert!(matches!(error, ManagerError::Io(_)));
    }
}
