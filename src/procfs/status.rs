/*!
 * Detailed Status
 * Opaque read of a process's key/value `status` block for display
 */

use crate::core::errors::{ProcError, Result};
use crate::core::limits::{STATUS_BUFFER_SIZE, STATUS_FILE};
use crate::core::types::Pid;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// Read up to one buffer of `<root>/<pid>/status` in a single call
///
/// The block is returned as-is; nothing here interprets its keys.
pub fn read_status(root: &Path, pid: Pid) -> Result<String> {
    let path = root.join(pid.to_string()).join(STATUS_FILE);

    let mut file = File::open(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ProcError::TargetNotFound(pid),
        _ => ProcError::RecordUnreadable {
            path: path.clone(),
            reason: e.to_string().into(),
        },
    })?;

    let mut buffer = vec![0u8; STATUS_BUFFER_SIZE];
    let bytes = file.read(&mut buffer).map_err(|e| {
        // ESRCH surfaces here when the process exits between open and read
        debug!(pid, error = %e, "Status read failed");
        ProcError::RecordUnreadable {
            path: path.clone(),
            reason: e.to_string().into(),
        }
    })?;
    buffer.truncate(bytes);

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
