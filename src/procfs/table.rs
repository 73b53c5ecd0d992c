/*!
 * Proc Table Enumerator
 * Walks the process and task directories and parses each entry's `stat` record
 */

use super::record::{ParseFailure, ProcessRecord, TableRecord, ThreadRecord};
use super::status;
use crate::core::errors::{ProcError, Result};
use crate::core::limits::{DEFAULT_PROC_ROOT, RECORD_BUFFER_SIZE, STAT_FILE, TASK_DIR};
use crate::core::types::Pid;
use crate::monitoring::OperationSpan;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of one enumeration pass
///
/// `records` holds everything that parsed, in discovery order. `skipped`
/// reports each entry that was dropped; those failures never abort the pass.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub records: Vec<T>,
    pub skipped: Vec<ProcError>,
}

impl<T> Snapshot<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: TableRecord> Snapshot<T> {
    /// Find the record whose field-0 identifier is `id`
    pub fn find(&self, id: u32) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.find(id).is_some()
    }
}

impl<T> IntoIterator for Snapshot<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Reader for a proc-style table rooted at a directory
///
/// Holds no state besides the root; every call re-reads the kernel.
#[derive(Debug, Clone)]
pub struct ProcTable {
    root: PathBuf,
}

impl ProcTable {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every live process
    pub fn enumerate_processes(&self) -> Result<Snapshot<ProcessRecord>> {
        let span = OperationSpan::new("enumerate_processes");
        let _entered = span.enter();

        let snapshot = scan(&self.root, ProcessRecord::parse)?;
        span.record_items(snapshot.records.len(), snapshot.skipped.len());
        Ok(snapshot)
    }

    /// List the threads of `pid`
    ///
    /// A missing or unreadable task directory (unknown pid, exited process,
    /// insufficient permissions) yields `DirectoryUnavailable`.
    pub fn enumerate_threads(&self, pid: Pid) -> Result<Snapshot<ThreadRecord>> {
        let span = OperationSpan::new("enumerate_threads").with_pid(pid);
        let _entered = span.enter();

        let task_dir = self.root.join(pid.to_string()).join(TASK_DIR);
        let snapshot = scan(&task_dir, |raw| ThreadRecord::parse(raw, pid))?;
        span.record_items(snapshot.records.len(), snapshot.skipped.len());
        Ok(snapshot)
    }

    /// Raw detailed status block of `pid`, unparsed
    pub fn status(&self, pid: Pid) -> Result<String> {
        status::read_status(&self.root, pid)
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

/// Walk `dir`, parsing `<dir>/<numeric entry>/stat` with `parse`
fn scan<T, F>(dir: &Path, parse: F) -> Result<Snapshot<T>>
where
    F: Fn(&str) -> std::result::Result<T, ParseFailure>,
{
    let entries = fs::read_dir(dir).map_err(|e| {
        warn!(path = %dir.display(), error = %e, "Cannot open table directory");
        ProcError::DirectoryUnavailable {
            path: dir.to_path_buf(),
            reason: e.to_string().into(),
        }
    })?;

    let mut snapshot = Snapshot::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "Skipping unreadable directory entry");
                snapshot.skipped.push(ProcError::RecordUnreadable {
                    path: dir.to_path_buf(),
                    reason: e.to_string().into(),
                });
                continue;
            }
        };

        let name = entry.file_name();
        if !is_numeric(&name) {
            continue;
        }

        let path = entry.path().join(STAT_FILE);
        let raw = match read_record(&path) {
            Ok(raw) => raw,
            Err(e) => {
                // Expected when a process exits mid-scan
                debug!(path = %path.display(), error = %e, "Skipping unreadable record");
                snapshot.skipped.push(ProcError::RecordUnreadable {
                    path,
                    reason: e.to_string().into(),
                });
                continue;
            }
        };

        match parse(&raw) {
            Ok(record) => snapshot.records.push(record),
            Err(failure) => {
                debug!(path = %path.display(), reason = %failure, "Skipping malformed record");
                snapshot.skipped.push(ProcError::MalformedRecord {
                    path,
                    reason: failure.to_string().into(),
                });
            }
        }
    }

    debug!(
        path = %dir.display(),
        records = snapshot.records.len(),
        skipped = snapshot.skipped.len(),
        "Table scan complete"
    );

    Ok(snapshot)
}

/// Read at most one buffer's worth of a record in a single call
///
/// Longer records are truncated; the parser works on the captured prefix.
fn read_record(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; RECORD_BUFFER_SIZE];
    let bytes = file.read(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer[..bytes]).into_owned())
}

/// Only all-digit names are identifiers; `self`, `thread-self` and friends are not
fn is_numeric(name: &OsStr) -> bool {
    name.to_str()
        .map(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}
