//! Generators that do not look at the profile

use super::AuthorizationGenerator;
use async_trait::async_trait;
use bastion_core::types::{IdentityProfile, RequestContext};
use bastion_core::GeneratorError;

/// Grants the same roles to every authenticated identity
pub struct StaticRolesGenerator {
    roles: Vec<String>,
}

impl StaticRolesGenerator {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl AuthorizationGenerator for StaticRolesGenerator {
    fn name(&self) -> &str {
        "static_roles"
    }

    async fn generate(
        &self,
        _context: &RequestContext,
        profile: &mut IdentityProfile,
    ) -> Result<(), GeneratorError> {
        profile.add_roles(self.roles.iter().cloned());
        Ok(())
    }
}

pub struct NoopGenerator;

#[async_trait]
impl AuthorizationGenerator for NoopGenerator {
    fn name(&self) -> &str {
        "noop"
    }

    async fn generate(
        &self,
        _context: &RequestContext,
        _profile: &mut IdentityProfile,
    ) -> Result<(), GeneratorError> {
        Ok(())
    }
}
