//! Error types for Bastion

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    ConfigRead(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::ConfigRead(_) | Error::ConfigParse(_) => "ConfigUnavailable",
        }
    }
}

/// Result of a credential check that did not yield a directory entry.
///
/// `NotAuthenticated` is an ordinary "no match" and must not be alerted on;
/// `Fault` means the directory could not be consulted at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("credentials were not accepted by the directory")]
    NotAuthenticated,

    #[error("directory fault: {0}")]
    Fault(String),
}

/// An authorization generator could not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("authorization generator '{generator}' failed: {message}")]
pub struct GeneratorError {
    pub generator: String,
    pub message: String,
}

impl GeneratorError {
    pub fn new(generator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
            message: message.into(),
        }
    }
}

/// System-level failures surfaced to the host as `AuthorizationOutcome::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("directory fault: {0}")]
    DirectoryFault(String),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

impl AuthenticationError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthenticationError::DirectoryFault(_) => "DirectoryFault",
            AuthenticationError::Generator(_) => "GeneratorError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AuthenticationError::DirectoryFault(_) => 503,
            AuthenticationError::Generator(_) => 500,
        }
    }
}
