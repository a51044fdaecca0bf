//! Credential types

use serde::Deserialize;
use std::fmt;

/// A password or other bind secret.
///
/// Deliberately has no `Display` or `Serialize` implementation and redacts
/// itself in `Debug` output, so it cannot leak into logs or error payloads.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw secret value, only for handing to the directory.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Username/secret pair for a single authentication attempt
#[derive(Debug, Clone)]
pub struct Credential {
    username: String,
    secret: Secret,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<Secret>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    /// A username made only of whitespace counts as missing.
    pub fn has_username(&self) -> bool {
        !self.username.trim().is_empty()
    }
}
