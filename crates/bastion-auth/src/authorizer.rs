//! Role-membership authorization

use bastion_core::config::AdminPolicy;
use bastion_core::types::IdentityProfile;
use std::collections::BTreeSet;
use std::sync::Arc;

/// True iff at least one role is in the allow-list. An empty allow-list
/// never matches.
pub fn authorize(roles: &BTreeSet<String>, allowed_roles: &BTreeSet<String>) -> bool {
    roles.iter().any(|role| allowed_roles.contains(role))
}

/// Admits profiles holding any of the policy's roles
#[derive(Debug, Clone)]
pub struct RequireAnyRoleAuthorizer {
    policy: Arc<AdminPolicy>,
}

impl RequireAnyRoleAuthorizer {
    pub fn new(policy: Arc<AdminPolicy>) -> Self {
        Self { policy }
    }

    pub fn allowed_roles(&self) -> &BTreeSet<String> {
        &self.policy.allowed_roles
    }

    pub fn is_authorized(&self, profile: &IdentityProfile) -> bool {
        authorize(profile.roles(), &self.policy.allowed_roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_any_match_grants() {
        assert!(authorize(
            &set(&["ROLE_USER", "ROLE_ADMIN"]),
            &set(&["ROLE_ADMIN", "ROLE_SUPERUSER"])
        ));
    }

    #[test]
    fn test_no_overlap_denies() {
        assert!(!authorize(&set(&["ROLE_ADMIN"]), &set(&["ROLE_SUPERUSER"])));
        assert!(!authorize(&set(&[]), &set(&["ROLE_ADMIN"])));
    }

    #[test]
    fn test_empty_allow_list_is_fail_closed() {
        let candidates = [
            set(&[]),
            set(&["ROLE_ADMIN"]),
            set(&["ROLE_ADMIN", "ROLE_SUPERUSER", ""]),
        ];

        for roles in &candidates {
            assert!(!authorize(roles, &set(&[])));
        }
    }

    #[test]
    fn test_authorizer_does_not_touch_inputs() {
        let policy = Arc::new(AdminPolicy::new(["ROLE_ADMIN"]));
        let authorizer = RequireAnyRoleAuthorizer::new(policy.clone());

        let mut profile = IdentityProfile::new("alice");
        profile.add_role("ROLE_ADMIN");
        let before = profile.clone();

        assert!(authorizer.is_authorized(&profile));
        assert!(authorizer.is_authorized(&profile));
        assert_eq!(profile, before);
        assert_eq!(*policy, AdminPolicy::new(["ROLE_ADMIN"]));
    }

    #[test]
    fn test_role_names_are_case_sensitive() {
        assert!(!authorize(&set(&["role_admin"]), &set(&["ROLE_ADMIN"])));
    }
}
