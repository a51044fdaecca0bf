//! Bastion Core Library
//!
//! Data model, error taxonomy and configuration for the Bastion admin gate.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AdminPolicy, BastionConfig, DirectoryConfig, GeneratorConfig};
pub use error::{AuthenticationError, DirectoryError, Error, GeneratorError, Result};

/// Bastion version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
