/*!
 * Core Module
 * Fundamental types, limits, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod inline_string;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use config::Config;
pub use errors::*;
pub use inline_string::InlineString;
pub use types::*;
