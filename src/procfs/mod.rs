/*!
 * Proc Tables
 * Enumeration and parsing of the kernel's textual process tables
 */

pub mod record;
pub mod status;
pub mod table;

pub use record::{ParseFailure, ProcessRecord, ProcessState, TableRecord, ThreadRecord};
pub use status::read_status;
pub use table::{ProcTable, Snapshot};
