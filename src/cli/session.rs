/*!
 * Interactive Session
 * Line-based menu loop dispatching to the proc table and process control
 */

use super::menu::{parse_choice, parse_pid, write_menu, MenuChoice};
use super::render::{write_processes, write_status, write_threads};
use crate::core::config::Config;
use crate::core::errors::ManagerError;
use crate::core::types::Pid;
use crate::process::{ProcessControl, Terminator, WorkPlan};
use crate::procfs::ProcTable;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use std::io::{BufRead, Write};
use tracing::{debug, info};

type SessionResult = std::result::Result<(), ManagerError>;

/// Menu loop over arbitrary input and output streams
pub struct Session<C, R, W> {
    terminator: Terminator<C>,
    table: ProcTable,
    process_work: WorkPlan,
    thread_work: WorkPlan,
    input: R,
    output: W,
    reporter: GraphicalReportHandler,
}

impl<C, R, W> Session<C, R, W>
where
    C: ProcessControl,
    R: BufRead,
    W: Write,
{
    pub fn new(control: C, config: &Config, input: R, output: W) -> Self {
        Self {
            terminator: Terminator::new(control, config.termination),
            table: ProcTable::new(config.proc_root.clone()),
            process_work: config.process_work,
            thread_work: config.thread_work,
            input,
            output,
            reporter: GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor()),
        }
    }

    /// Consume the session, returning its output stream
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the exit choice or end of input
    ///
    /// Operation failures are printed and the loop continues; only failures
    /// of the terminal streams end it early.
    pub fn run(&mut self) -> SessionResult {
        writeln!(self.output, "Process and Thread Management System")?;
        writeln!(self.output, "Using direct Linux system calls")?;
        writeln!(self.output, "Current PID: {}", std::process::id())?;

        loop {
            write_menu(&mut self.output)?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                debug!("End of input");
                break;
            };

            let choice = match parse_choice(&line) {
                Ok(choice) => choice,
                Err(e) => {
                    writeln!(self.output, "{}", e)?;
                    continue;
                }
            };

            if choice == MenuChoice::Exit {
                writeln!(self.output, "Exiting...")?;
                break;
            }
            self.dispatch(choice)?;
        }

        self.output.flush()?;
        Ok(())
    }

    fn dispatch(&mut self, choice: MenuChoice) -> SessionResult {
        debug!(choice = choice.number(), "Menu choice");
        let result = match choice {
            MenuChoice::SpawnProcess => self.spawn_process(),
            MenuChoice::SpawnThread => self.spawn_thread(),
            MenuChoice::ListProcesses => self.list_processes(),
            MenuChoice::ListThreads | MenuChoice::Terminate | MenuChoice::Status => {
                let Some(pid) = self.read_pid(choice)? else {
                    return Ok(());
                };
                match choice {
                    MenuChoice::ListThreads => self.list_threads(pid),
                    MenuChoice::Terminate => self.terminate(pid),
                    _ => self.show_status(pid),
                }
            }
            MenuChoice::Exit => Ok(()),
        };

        match result {
            Err(ManagerError::Proc(e)) => self.report(&e),
            other => other,
        }
    }

    fn spawn_process(&mut self) -> SessionResult {
        writeln!(self.output, "\nSpawning process...")?;
        // Nothing buffered may be inherited by the child
        self.output.flush()?;

        let child = self.terminator.control().spawn_process(self.process_work)?;
        writeln!(self.output, "Parent spawned child with PID: {}", child.pid())?;
        writeln!(self.output, "Waiting for the child process to finish...")?;
        self.output.flush()?;

        let report = child.wait()?;
        writeln!(self.output, "Child process {} {}", report.pid, report)?;
        Ok(())
    }

    fn spawn_thread(&mut self) -> SessionResult {
        writeln!(self.output, "\nSpawning thread...")?;
        self.output.flush()?;

        let thread = self.terminator.control().spawn_thread(self.thread_work)?;
        writeln!(self.output, "Thread spawned with TID: {}", thread.tid())?;
        self.output.flush()?;

        let report = thread.join()?;
        writeln!(self.output, "Thread {} {}", report.pid, report)?;
        Ok(())
    }

    fn list_processes(&mut self) -> SessionResult {
        let snapshot = self.table.enumerate_processes()?;
        write_processes(&mut self.output, &snapshot)?;
        Ok(())
    }

    fn list_threads(&mut self, pid: Pid) -> SessionResult {
        match self.table.enumerate_threads(pid) {
            Ok(snapshot) => write_threads(&mut self.output, pid, Some(&snapshot))?,
            Err(e) => {
                write_threads(&mut self.output, pid, None)?;
                self.report(&e)?;
            }
        }
        Ok(())
    }

    fn terminate(&mut self, pid: Pid) -> SessionResult {
        writeln!(self.output, "Attempting to terminate process {}...", pid)?;
        self.output.flush()?;

        let outcome = self.terminator.terminate(pid);
        info!(pid, outcome = outcome.as_str(), "Termination requested from menu");
        match outcome.clone().into_error(pid) {
            None => writeln!(self.output, "Process {}: {}", pid, outcome)?,
            Some(e) => self.report(&e)?,
        }
        Ok(())
    }

    fn show_status(&mut self, pid: Pid) -> SessionResult {
        let status = self.table.status(pid)?;
        write_status(&mut self.output, pid, &status)?;
        Ok(())
    }

    /// Prompt for and read a pid; `None` after printing why the line was rejected
    fn read_pid(&mut self, choice: MenuChoice) -> std::result::Result<Option<Pid>, ManagerError> {
        if let Some(prompt) = choice.pid_prompt() {
            write!(self.output, "{}", prompt)?;
            self.output.flush()?;
        }

        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        match parse_pid(&line) {
            Ok(pid) => Ok(Some(pid)),
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                Ok(None)
            }
        }
    }

    /// One line of input, `None` at end of input
    fn read_line(&mut self) -> std::result::Result<Option<String>, ManagerError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn report(&mut self, diagnostic: &dyn Diagnostic) -> SessionResult {
        let mut rendered = String::new();
        if self.reporter.render_report(&mut rendered, diagnostic).is_err() {
            rendered = diagnostic.to_string();
        }
        writeln!(self.output, "{}", rendered.trim_end())?;
        Ok(())
    }
}
