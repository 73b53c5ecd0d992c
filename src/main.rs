/*!
 * Process Manager - Main Entry Point
 *
 * Interactive menu for:
 * - Spawning processes and threads
 * - Listing processes and their threads
 * - Terminating a process (SIGTERM, grace period, SIGKILL)
 * - Showing a process's detailed status
 */

use std::io;
use tracing::info;

use procman::{init_tracing, Config, LinuxControl, Session};

fn main() -> miette::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.trace_json);

    info!(
        proc_root = %config.proc_root.display(),
        grace_ms = config.termination.grace_period.as_millis() as u64,
        send_retries = config.termination.send_retries,
        "procman starting"
    );

    let control = LinuxControl::with_stack_size(config.thread_stack_size);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(control, &config, stdin.lock(), stdout.lock());
    session.run()?;

    info!("procman exiting");
    Ok(())
}
