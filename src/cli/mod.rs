/*!
 * CLI Module
 * Interactive menu front end
 */

pub mod menu;
pub mod render;
pub mod session;

pub use menu::{parse_choice, parse_pid, InputError, MenuChoice};
pub use session::Session;
