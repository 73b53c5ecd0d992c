/*!
 * Table Rendering
 * Aligned text output for process and thread listings
 */

use crate::core::types::Pid;
use crate::procfs::{ProcessRecord, Snapshot, ThreadRecord};
use std::io::{self, Write};

const ID_WIDTH: usize = 8;
const NAME_WIDTH: usize = 20;

/// Print a process listing with its total and, if any, the skipped count
pub fn write_processes<W: Write>(out: &mut W, snapshot: &Snapshot<ProcessRecord>) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== PROCESS LIST ===")?;
    writeln!(
        out,
        "{:<id$} {:<name$} {}",
        "PID",
        "NAME",
        "STATE",
        id = ID_WIDTH,
        name = NAME_WIDTH
    )?;
    writeln!(out, "{}", "-".repeat(ID_WIDTH + NAME_WIDTH + 8))?;

    for record in &snapshot.records {
        writeln!(
            out,
            "{:<id$} {:<name$} {}",
            record.pid,
            record.name,
            record.state.code(),
            id = ID_WIDTH,
            name = NAME_WIDTH
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Total processes listed: {}", snapshot.len())?;
    write_skipped(out, snapshot.skipped.len())
}

/// Print the threads of `pid`
///
/// `None` renders an empty listing, used when the task directory could not be opened.
pub fn write_threads<W: Write>(
    out: &mut W,
    pid: Pid,
    snapshot: Option<&Snapshot<ThreadRecord>>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== THREADS OF PROCESS {} ===", pid)?;
    writeln!(
        out,
        "{:<id$} {:<id$} {:<name$} {}",
        "TID",
        "PID",
        "NAME",
        "STATE",
        id = ID_WIDTH,
        name = NAME_WIDTH
    )?;
    writeln!(out, "{}", "-".repeat(2 * ID_WIDTH + NAME_WIDTH + 8))?;

    let (records, skipped) = match snapshot {
        Some(snapshot) => (snapshot.records.as_slice(), snapshot.skipped.len()),
        None => (&[][..], 0),
    };

    for record in records {
        writeln!(
            out,
            "{:<id$} {:<id$} {:<name$} {}",
            record.tid,
            record.owning_pid,
            record.name,
            record.state.code(),
            id = ID_WIDTH,
            name = NAME_WIDTH
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Total threads listed: {}", records.len())?;
    write_skipped(out, skipped)
}

/// Print the raw status block of `pid`
pub fn write_status<W: Write>(out: &mut W, pid: Pid, status: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== STATUS OF PROCESS {} ===", pid)?;
    writeln!(out, "{}", status.trim_end())
}

fn write_skipped<W: Write>(out: &mut W, skipped: usize) -> io::Result<()> {
    if skipped > 0 {
        writeln!(out, "Skipped entries: {}", skipped)?;
    }
    Ok(())
}
