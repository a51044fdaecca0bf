//! Directory entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A directory record returned by a successful bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    distinguished_name: String,
    attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(
        distinguished_name: impl Into<String>,
        attributes: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Self {
        Self {
            distinguished_name: distinguished_name.into(),
            attributes: attributes.into_iter().collect(),
        }
    }

    pub fn distinguished_name(&self) -> &str {
        &self.distinguished_name
    }

    pub fn attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.attributes
    }

    /// Get all values of an attribute
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(|v| v.as_slice())
    }
}
