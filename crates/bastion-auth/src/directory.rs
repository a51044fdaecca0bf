//! Directory authentication
//!
//! [`DirectoryClient`] is the seam to the directory server; [`DirectoryAuthenticator`]
//! applies input rules and folds the client's three-way answer into
//! `Result<DirectoryEntry, DirectoryError>`.

use async_trait::async_trait;
use bastion_core::types::{Credential, DirectoryEntry, Secret};
use bastion_core::DirectoryError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Why the directory refused a credential. Only used for diagnostics; callers
/// see every variant as the same `NotAuthenticated` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidCredentials,
    UnknownUser,
    AccountDisabled,
    AccountLocked,
    /// Another credential refusal, e.g. insufficient access
    Other(u32),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidCredentials => write!(f, "invalid credentials"),
            RejectReason::UnknownUser => write!(f, "no matching entry"),
            RejectReason::AccountDisabled => write!(f, "account disabled"),
            RejectReason::AccountLocked => write!(f, "account locked"),
            RejectReason::Other(rc) => write!(f, "bind refused with result code {}", rc),
        }
    }
}

/// Answer of a directory bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindResponse {
    Success(DirectoryEntry),
    Rejected(RejectReason),
    Fault(String),
}

/// Directory server collaborator.
///
/// Implementations own transport, TLS and timeouts; a timeout must be reported
/// as [`BindResponse::Fault`]. A successful bind returns the user's entry with
/// all of its user and operational attributes.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn bind(&self, username: &str, secret: &Secret) -> BindResponse;
}

/// Verifies credentials against a [`DirectoryClient`]
#[derive(Clone)]
pub struct DirectoryAuthenticator {
    client: Arc<dyn DirectoryClient>,
    allow_empty_password: bool,
}

impl DirectoryAuthenticator {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self {
            client,
            allow_empty_password: false,
        }
    }

    pub fn allow_empty_password(mut self, allow: bool) -> Self {
        self.allow_empty_password = allow;
        self
    }

    /// Verify a credential and return the matching entry.
    pub async fn verify(&self, credential: &Credential) -> Result<DirectoryEntry, DirectoryError> {
        let username = credential.username();

        if !credential.has_username() {
            debug!("Rejecting authentication request with an empty username");
            return Err(DirectoryError::NotAuthenticated);
        }

        // An empty simple bind is an unauthenticated bind, which most servers accept.
        if credential.secret().is_empty() && !self.allow_empty_password {
            debug!("Rejecting empty password for user [{}]", username);
            return Err(DirectoryError::NotAuthenticated);
        }

        debug!("Executing directory authentication request for user [{}]", username);

        match self.client.bind(username, credential.secret()).await {
            BindResponse::Success(entry) => {
                debug!(
                    "Directory accepted user [{}] as [{}]",
                    username,
                    entry.distinguished_name()
                );
                Ok(entry)
            }
            BindResponse::Rejected(reason) => {
                warn!("Directory rejected user [{}]: {}", username, reason);
                Err(DirectoryError::NotAuthenticated)
            }
            BindResponse::Fault(cause) => {
                error!("Directory fault while authenticating [{}]: {}", username, cause);
                Err(DirectoryError::Fault(cause))
            }
        }
    }
}
