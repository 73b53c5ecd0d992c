/*!
 * Menu Input
 * Numbered menu choices and line parsing for the interactive session
 */

use crate::core::types::Pid;
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

/// One entry of the interactive menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SpawnProcess,
    SpawnThread,
    ListProcesses,
    ListThreads,
    Terminate,
    Status,
    Exit,
}

impl MenuChoice {
    /// Menu entries in display order
    pub const ALL: [MenuChoice; 7] = [
        MenuChoice::SpawnProcess,
        MenuChoice::SpawnThread,
        MenuChoice::ListProcesses,
        MenuChoice::ListThreads,
        MenuChoice::Terminate,
        MenuChoice::Status,
        MenuChoice::Exit,
    ];

    pub fn from_number(number: i64) -> Option<Self> {
        match number {
            1 => Some(MenuChoice::SpawnProcess),
            2 => Some(MenuChoice::SpawnThread),
            3 => Some(MenuChoice::ListProcesses),
            4 => Some(MenuChoice::ListThreads),
            5 => Some(MenuChoice::Terminate),
            6 => Some(MenuChoice::Status),
            7 => Some(MenuChoice::Exit),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            MenuChoice::SpawnProcess => 1,
            MenuChoice::SpawnThread => 2,
            MenuChoice::ListProcesses => 3,
            MenuChoice::ListThreads => 4,
            MenuChoice::Terminate => 5,
            MenuChoice::Status => 6,
            MenuChoice::Exit => 7,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::SpawnProcess => "Spawn process",
            MenuChoice::SpawnThread => "Spawn thread",
            MenuChoice::ListProcesses => "List processes",
            MenuChoice::ListThreads => "List threads of a process",
            MenuChoice::Terminate => "Terminate process",
            MenuChoice::Status => "Show process status",
            MenuChoice::Exit => "Exit",
        }
    }

    /// Prompt shown before reading a pid, for choices that need one
    pub fn pid_prompt(&self) -> Option<&'static str> {
        match self {
            MenuChoice::ListThreads => Some("Enter the PID whose threads to list: "),
            MenuChoice::Terminate => Some("Enter the PID to terminate: "),
            MenuChoice::Status => Some("Enter the PID to inspect: "),
            _ => None,
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

/// Rejected user input
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid input")]
    InvalidInput,

    #[error("Invalid option")]
    InvalidOption(i64),

    #[error("Invalid PID")]
    InvalidPid,
}

/// Parse a menu line; only the first token counts, the rest of the line is discarded
pub fn parse_choice(line: &str) -> Result<MenuChoice, InputError> {
    let number = first_token(line)
        .and_then(|token| token.parse::<i64>().ok())
        .ok_or(InputError::InvalidInput)?;
    MenuChoice::from_number(number).ok_or(InputError::InvalidOption(number))
}

/// Parse a pid line
pub fn parse_pid(line: &str) -> Result<Pid, InputError> {
    first_token(line)
        .and_then(|token| token.parse::<Pid>().ok())
        .ok_or(InputError::InvalidPid)
}

fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Print the menu followed by the choice prompt
pub fn write_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== PROCESS AND THREAD MANAGER ===")?;
    for choice in MenuChoice::ALL {
        writeln!(out, "{}", choice)?;
    }
    write!(out, "Choose an option: ")?;
    out.flush()
}
