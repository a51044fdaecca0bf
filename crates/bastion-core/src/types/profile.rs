//! Identity profiles built from directory entries

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Portable identity of an authenticated principal.
///
/// Roles and attribute values can be added but never removed, so every
/// generator only ever widens what earlier stages produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityProfile {
    id: String,
    distinguished_name: Option<String>,
    attributes: BTreeMap<String, Vec<String>>,
    roles: BTreeSet<String>,
}

impl IdentityProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            distinguished_name: None,
            attributes: BTreeMap::new(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_distinguished_name(mut self, dn: impl Into<String>) -> Self {
        self.distinguished_name = Some(dn.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn distinguished_name(&self) -> Option<&str> {
        self.distinguished_name.as_deref()
    }

    pub fn attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(|v| v.as_slice())
    }

    /// Get first value of an attribute
    pub fn first_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    /// Append values to an attribute, creating it (possibly empty) if absent.
    pub fn add_attribute<I, S>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if the role was not present before.
    pub fn add_role(&mut self, role: impl Into<String>) -> bool {
        self.roles.insert(role.into())
    }

    pub fn add_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
    }
}
