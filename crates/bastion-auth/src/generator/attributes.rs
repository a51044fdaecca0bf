//! Attribute-to-role generator

use super::{AuthorizationGenerator, RoleMapping};
use async_trait::async_trait;
use bastion_core::types::{IdentityProfile, RequestContext};
use bastion_core::GeneratorError;
use tracing::debug;

/// Derives roles from the values of a single profile attribute.
///
/// Attribute names are matched case-insensitively, as LDAP does.
pub struct AttributeRolesGenerator {
    attribute: String,
    mapping: RoleMapping,
}

impl AttributeRolesGenerator {
    pub fn new(attribute: impl Into<String>, mapping: RoleMapping) -> Self {
        Self {
            attribute: attribute.into(),
            mapping,
        }
    }

    fn values(&self, profile: &IdentityProfile) -> Vec<String> {
        profile
            .attributes()
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(&self.attribute))
            .flat_map(|(_, values)| values.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl AuthorizationGenerator for AttributeRolesGenerator {
    fn name(&self) -> &str {
        "attribute_roles"
    }

    async fn generate(
        &self,
        _context: &RequestContext,
        profile: &mut IdentityProfile,
    ) -> Result<(), GeneratorError> {
        let values = self.values(profile);
        if values.is_empty() {
            debug!(
                "Profile [{}] has no values for attribute [{}]",
                profile.id(),
                self.attribute
            );
            return Ok(());
        }

        for value in &values {
            profile.add_roles(self.mapping.roles_for(value));
        }

        Ok(())
    }
}
