//! In-memory collaborators for unit tests

use crate::directory::{BindResponse, DirectoryClient, RejectReason};
use crate::generator::GroupSource;
use async_trait::async_trait;
use bastion_core::types::{DirectoryEntry, Secret};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn entry(username: &str, attributes: &[(&str, &[&str])]) -> DirectoryEntry {
    DirectoryEntry::new(
        format!("uid={},ou=people,dc=example,dc=com", username),
        attributes.iter().map(|(name, values)| {
            (
                name.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            )
        }),
    )
}

/// Directory holding a fixed set of users
#[derive(Default)]
pub(crate) struct StaticDirectory {
    users: HashMap<String, (String, DirectoryEntry)>,
    fault: Option<String>,
    binds: AtomicUsize,
}

impl StaticDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_user(
        mut self,
        username: &str,
        password: &str,
        attributes: &[(&str, &[&str])],
    ) -> Self {
        self.users.insert(
            username.to_string(),
            (password.to_string(), entry(username, attributes)),
        );
        self
    }

    /// Every bind reports a transport fault
    pub(crate) fn unreachable(mut self, cause: &str) -> Self {
        self.fault = Some(cause.to_string());
        self
    }

    pub(crate) fn bind_count(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for StaticDirectory {
    async fn bind(&self, username: &str, secret: &Secret) -> BindResponse {
        self.binds.fetch_add(1, Ordering::SeqCst);

        if let Some(cause) = &self.fault {
            return BindResponse::Fault(cause.clone());
        }

        match self.users.get(username) {
            Some((password, entry)) if password == secret.expose() => {
                BindResponse::Success(entry.clone())
            }
            Some(_) => BindResponse::Rejected(RejectReason::InvalidCredentials),
            None => BindResponse::Rejected(RejectReason::UnknownUser),
        }
    }
}

/// Group source answering from a fixed table, optionally after a delay
#[derive(Default)]
pub(crate) struct StaticGroups {
    groups: HashMap<String, Vec<String>>,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl StaticGroups {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_groups(mut self, username: &str, groups: &[&str]) -> Self {
        self.groups.insert(
            username.to_string(),
            groups.iter().map(|g| g.to_string()).collect(),
        );
        self
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }
}

#[async_trait]
impl GroupSource for StaticGroups {
    async fn groups_for(&self, _user_dn: &str, username: &str) -> Result<Vec<String>, String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(message.clone());
        }
        Ok(self.groups.get(username).cloned().unwrap_or_default())
    }
}
