//! Group-membership-to-role generator

use super::{AuthorizationGenerator, RoleMapping};
use async_trait::async_trait;
use bastion_core::types::{IdentityProfile, RequestContext};
use bastion_core::GeneratorError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// External source of group memberships
#[async_trait]
pub trait GroupSource: Send + Sync {
    async fn groups_for(&self, user_dn: &str, username: &str) -> Result<Vec<String>, String>;
}

/// Looks up the user's groups and maps each group name to roles.
///
/// A failed or slow lookup fails the generator; it never grants or denies by itself.
pub struct GroupRolesGenerator {
    source: Arc<dyn GroupSource>,
    mapping: RoleMapping,
    timeout: Duration,
}

impl GroupRolesGenerator {
    pub fn new(source: Arc<dyn GroupSource>, mapping: RoleMapping, timeout: Duration) -> Self {
        Self {
            source,
            mapping,
            timeout,
        }
    }
}

#[async_trait]
impl AuthorizationGenerator for GroupRolesGenerator {
    fn name(&self) -> &str {
        "group_roles"
    }

    async fn generate(
        &self,
        context: &RequestContext,
        profile: &mut IdentityProfile,
    ) -> Result<(), GeneratorError> {
        let user_dn = profile
            .distinguished_name()
            .unwrap_or_else(|| profile.id())
            .to_string();

        let lookup = self.source.groups_for(&user_dn, profile.id());
        let groups = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(groups)) => groups,
            Ok(Err(e)) => {
                warn!(
                    "Group lookup for [{}] failed (request {}): {}",
                    profile.id(),
                    context.request_id,
                    e
                );
                return Err(GeneratorError::new(self.name(), e));
            }
            Err(_) => {
                warn!(
                    "Group lookup for [{}] timed out after {:?} (request {})",
                    profile.id(),
                    self.timeout,
                    context.request_id
                );
                return Err(GeneratorError::new(
                    self.name(),
                    format!("group lookup timed out after {:?}", self.timeout),
                ));
            }
        };

        debug!("Found {} groups for [{}]", groups.len(), profile.id());

        for group in &groups {
            profile.add_roles(self.mapping.roles_for(group));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticGroups;

    fn generator(source: StaticGroups, timeout: Duration) -> GroupRolesGenerator {
        GroupRolesGenerator::new(Arc::new(source), RoleMapping::prefixed("ROLE_"), timeout)
    }

    #[tokio::test]
    async fn test_groups_become_roles() {
        let source = StaticGroups::new().with_groups("alice", &["admins", "ops"]);
        let mut profile = IdentityProfile::new("alice");

        generator(source, Duration::from_secs(1))
            .generate(&RequestContext::new(), &mut profile)
            .await
            .unwrap();

        assert!(profile.has_role("ROLE_ADMINS"));
        assert!(profile.has_role("ROLE_OPS"));
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_an_error() {
        let source = StaticGroups::new()
            .with_groups("alice", &["admins"])
            .delayed(Duration::from_secs(30));
        let mut profile = IdentityProfile::new("alice");

        let err = generator(source, Duration::from_millis(20))
            .generate(&RequestContext::new(), &mut profile)
            .await
            .unwrap_err();

        assert_eq!(err.generator, "group_roles");
        assert!(err.message.contains("timed out"));
        assert!(profile.roles().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error() {
        let source = StaticGroups::new().failing("connection reset");
        let mut profile = IdentityProfile::new("alice");

        let err = generator(source, Duration::from_secs(1))
            .generate(&RequestContext::new(), &mut profile)
            .await
            .unwrap_err();

        assert_eq!(err.message, "connection reset");
    }
}
