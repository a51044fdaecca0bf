//! CLI command implementations

pub mod authenticate;
pub mod check_config;
pub mod test_connection;

use crate::OutputFormat;
use bastion_core::config::BastionConfig;
use serde::Serialize;

/// Access granted, or command succeeded
pub const EXIT_OK: u8 = 0;
/// Credentials rejected or role missing
pub const EXIT_DENIED: u8 = 1;
/// Directory fault, generator failure or bad configuration
pub const EXIT_ERROR: u8 = 2;

/// Context passed to all commands
pub struct CommandContext {
    pub config: BastionConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg);
    }
}
