//! Authorization generators
//!
//! Pluggable steps run after authentication that derive roles (and
//! occasionally attributes) for the profile. They run in configured order and
//! each one sees what the previous ones added.

mod attributes;
mod fixed;
mod groups;

pub use attributes::AttributeRolesGenerator;
pub use fixed::{NoopGenerator, StaticRolesGenerator};
pub use groups::{GroupRolesGenerator, GroupSource};

use crate::ldap::LdapGroupSource;
use async_trait::async_trait;
use bastion_core::config::{DirectoryConfig, GeneratorConfig};
use bastion_core::types::{IdentityProfile, RequestContext};
use bastion_core::GeneratorError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait AuthorizationGenerator: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    async fn generate(
        &self,
        context: &RequestContext,
        profile: &mut IdentityProfile,
    ) -> Result<(), GeneratorError>;
}

/// Maps source values (attribute values, group names) to role names
#[derive(Debug, Clone, Default)]
pub struct RoleMapping {
    mappings: HashMap<String, Vec<String>>,
    prefix: Option<String>,
}

impl RoleMapping {
    pub fn new(mappings: HashMap<String, Vec<String>>, prefix: Option<String>) -> Self {
        Self { mappings, prefix }
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self::new(HashMap::new(), Some(prefix.into()))
    }

    pub fn explicit<I, K, V>(mappings: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mappings = mappings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into_iter().map(Into::into).collect()))
            .collect();
        Self::new(mappings, None)
    }

    /// Explicit mappings win; otherwise `prefix + VALUE` when a prefix is set.
    pub fn roles_for(&self, value: &str) -> Vec<String> {
        if let Some(roles) = self.mappings.get(value) {
            return roles.clone();
        }

        match &self.prefix {
            Some(prefix) if !value.is_empty() => {
                vec![format!("{}{}", prefix, value.to_uppercase())]
            }
            _ => Vec::new(),
        }
    }
}

/// Instantiate the configured generators in order.
pub fn build_generators(
    configs: &[GeneratorConfig],
    directory: &DirectoryConfig,
) -> Vec<Arc<dyn AuthorizationGenerator>> {
    configs
        .iter()
        .map(|config| -> Arc<dyn AuthorizationGenerator> {
            match config {
                GeneratorConfig::AttributeRoles {
                    attribute,
                    mappings,
                    role_prefix,
                } => Arc::new(AttributeRolesGenerator::new(
                    attribute.clone(),
                    RoleMapping::new(mappings.clone(), role_prefix.clone()),
                )),
                GeneratorConfig::GroupRoles {
                    base_dn,
                    filter,
                    name_attribute,
                    mappings,
                    role_prefix,
                    timeout_seconds,
                } => {
                    let filter = filter
                        .clone()
                        .unwrap_or_else(|| directory.server_type.default_group_filter().to_string());
                    let source = LdapGroupSource::new(
                        directory.clone(),
                        base_dn.clone(),
                        filter,
                        name_attribute.clone(),
                    );
                    Arc::new(GroupRolesGenerator::new(
                        Arc::new(source),
                        RoleMapping::new(mappings.clone(), role_prefix.clone()),
                        Duration::from_secs(*timeout_seconds),
                    ))
                }
                GeneratorConfig::StaticRoles { roles } => {
                    Arc::new(StaticRolesGenerator::new(roles.clone()))
                }
                GeneratorConfig::Noop => Arc::new(NoopGenerator),
            }
        })
        .collect()
}
