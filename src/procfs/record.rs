/*!
 * Proc Table Records
 * Typed process/thread records and the positional `stat` parser
 */

use crate::core::inline_string::InlineString;
use crate::core::limits::MAX_NAME_LEN;
use crate::core::types::{Pid, Tid};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a record could not be turned into a typed value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("record is empty")]
    MissingId,

    #[error("identifier {0:?} is not a positive integer")]
    InvalidId(String),

    #[error("record ends before the name field")]
    MissingName,

    #[error("record ends before the state field")]
    MissingState,
}

/// Scheduler state code reported in field 2 of a `stat` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// R
    Running,
    /// S (interruptible)
    Sleeping,
    /// D (uninterruptible)
    DiskSleep,
    /// Z
    Zombie,
    /// T
    Stopped,
    /// t
    TracingStop,
    /// X
    Dead,
    /// K
    WakeKill,
    /// W
    Waking,
    /// P
    Parked,
    /// I
    Idle,
    /// Any code outside the known alphabet, kept verbatim
    Unknown(char),
}

impl ProcessState {
    pub fn from_code(code: char) -> Self {
        match code {
            'R' => ProcessState::Running,
            'S' => ProcessState::Sleeping,
            'D' => ProcessState::DiskSleep,
            'Z' => ProcessState::Zombie,
            'T' => ProcessState::Stopped,
            't' => ProcessState::TracingStop,
            'X' => ProcessState::Dead,
            'K' => ProcessState::WakeKill,
            'W' => ProcessState::Waking,
            'P' => ProcessState::Parked,
            'I' => ProcessState::Idle,
            other => ProcessState::Unknown(other),
        }
    }

    /// The single-character code as the kernel wrote it
    pub fn code(&self) -> char {
        match self {
            ProcessState::Running => 'R',
            ProcessState::Sleeping => 'S',
            ProcessState::DiskSleep => 'D',
            ProcessState::Zombie => 'Z',
            ProcessState::Stopped => 'T',
            ProcessState::TracingStop => 't',
            ProcessState::Dead => 'X',
            ProcessState::WakeKill => 'K',
            ProcessState::Waking => 'W',
            ProcessState::Parked => 'P',
            ProcessState::Idle => 'I',
            ProcessState::Unknown(c) => *c,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ProcessState::Unknown(_))
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProcessState::Running => "running",
            ProcessState::Sleeping => "sleeping",
            ProcessState::DiskSleep => "disk sleep",
            ProcessState::Zombie => "zombie",
            ProcessState::Stopped => "stopped",
            ProcessState::TracingStop => "tracing stop",
            ProcessState::Dead => "dead",
            ProcessState::WakeKill => "wakekill",
            ProcessState::Waking => "waking",
            ProcessState::Parked => "parked",
            ProcessState::Idle => "idle",
            ProcessState::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Records that can be located in a snapshot by their table identifier
pub trait TableRecord {
    /// Identifier from field 0 (pid for processes, tid for threads)
    fn id(&self) -> u32;
}

/// One process observed during an enumeration pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessRecord {
    pub pid: Pid,
    pub name: InlineString,
    pub state: ProcessState,
    /// Parent pid; absent when the record was cut short before field 3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppid: Option<Pid>,
}

impl ProcessRecord {
    /// Parse one `/proc/<pid>/stat` record
    pub fn parse(raw: &str) -> Result<Self, ParseFailure> {
        let fields = StatFields::parse(raw)?;
        Ok(Self {
            pid: fields.id,
            name: fields.name,
            state: fields.state,
            ppid: fields.ppid,
        })
    }
}

impl TableRecord for ProcessRecord {
    fn id(&self) -> u32 {
        self.pid
    }
}

/// One thread observed inside a process's task directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ThreadRecord {
    pub tid: Tid,
    /// Process whose task directory listed this thread
    pub owning_pid: Pid,
    pub name: InlineString,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppid: Option<Pid>,
}

impl ThreadRecord {
    /// Parse one `/proc/<pid>/task/<tid>/stat` record
    ///
    /// `owning_pid` comes from the directory scope, never from the file.
    pub fn parse(raw: &str, owning_pid: Pid) -> Result<Self, ParseFailure> {
        let fields = StatFields::parse(raw)?;
        Ok(Self {
            tid: fields.id,
            owning_pid,
            name: fields.name,
            state: fields.state,
            ppid: fields.ppid,
        })
    }
}

impl TableRecord for ThreadRecord {
    fn id(&self) -> u32 {
        self.tid
    }
}

/// Leading fields shared by process and thread records
struct StatFields {
    id: u32,
    name: InlineString,
    state: ProcessState,
    ppid: Option<Pid>,
}

impl StatFields {
    fn parse(raw: &str) -> Result<Self, ParseFailure> {
        let mut fields = raw
            .trim_end_matches(|c: char| c == '\n' || c == '\0')
            .split(' ')
            .filter(|field| !field.is_empty());

        let id = fields.next().ok_or(ParseFailure::MissingId)?;
        let id = match id.parse::<u32>() {
            Ok(id) if id > 0 => id,
            _ => return Err(ParseFailure::InvalidId(id.to_string())),
        };

        let name = fields.next().ok_or(ParseFailure::MissingName)?;
        let name = strip_parens(name);

        let state = fields
            .next()
            .and_then(|field| field.chars().next())
            .ok_or(ParseFailure::MissingState)?;

        // Field 3 may be missing or cut mid-number by the fixed read buffer
        let ppid = fields.next().and_then(|field| field.parse::<Pid>().ok());

        Ok(Self {
            id,
            name: InlineString::truncated(name, MAX_NAME_LEN),
            state: ProcessState::from_code(state),
            ppid,
        })
    }
}

/// Remove one leading `(` and one trailing `)` if present
fn strip_parens(field: &str) -> &str {
    let field = field.strip_prefix('(').unwrap_or(field);
    field.strip_suffix(')').unwrap_or(field)
}
