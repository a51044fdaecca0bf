//! Terminal results of the authentication pipeline

use crate::error::AuthenticationError;
use crate::types::IdentityProfile;

/// Identity admitted to the administrative surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedIdentity {
    pub profile: IdentityProfile,

    /// Roles remapped into authority names for the host framework
    pub authorities: Vec<String>,
}

impl GrantedIdentity {
    pub fn new(profile: IdentityProfile) -> Self {
        let authorities = profile.roles().iter().cloned().collect();
        Self {
            profile,
            authorities,
        }
    }

    pub fn username(&self) -> &str {
        self.profile.id()
    }
}

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The directory rejected the credential
    NotAuthenticated,
    /// Identity is valid but holds none of the allowed roles
    InsufficientRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Granted(GrantedIdentity),
    Denied(Denial),
    Error(AuthenticationError),
}

impl AuthorizationOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AuthorizationOutcome::Granted(_))
    }

    pub fn identity(&self) -> Option<&GrantedIdentity> {
        match self {
            AuthorizationOutcome::Granted(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthorizationOutcome::Granted(_) => "Granted",
            AuthorizationOutcome::Denied(Denial::NotAuthenticated) => "NotAuthenticated",
            AuthorizationOutcome::Denied(Denial::InsufficientRole) => "Denied",
            AuthorizationOutcome::Error(e) => e.code(),
        }
    }

    /// Suggested status for HTTP hosts
    pub fn http_status(&self) -> u16 {
        match self {
            AuthorizationOutcome::Granted(_) => 200,
            AuthorizationOutcome::Denied(Denial::NotAuthenticated) => 401,
            AuthorizationOutcome::Denied(Denial::InsufficientRole) => 403,
            AuthorizationOutcome::Error(e) => e.http_status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;

    #[test]
    fn test_outcomes_are_distinguishable() {
        let mut profile = IdentityProfile::new("alice");
        profile.add_role("ROLE_ADMIN");

        let outcomes = [
            AuthorizationOutcome::Granted(GrantedIdentity::new(profile)),
            AuthorizationOutcome::Denied(Denial::NotAuthenticated),
            AuthorizationOutcome::Denied(Denial::InsufficientRole),
            AuthorizationOutcome::Error(AuthenticationError::DirectoryFault("down".into())),
            AuthorizationOutcome::Error(GeneratorError::new("g", "boom").into()),
        ];

        let codes: std::collections::BTreeSet<_> = outcomes.iter().map(|o| o.code()).collect();
        assert_eq!(codes.len(), outcomes.len());

        let statuses: Vec<u16> = outcomes.iter().map(|o| o.http_status()).collect();
        assert_eq!(statuses, vec![200, 401, 403, 503, 500]);
    }

    #[test]
    fn test_granted_authorities_mirror_roles() {
        let mut profile = IdentityProfile::new("alice");
        profile.add_roles(["ROLE_B", "ROLE_A"]);

        let granted = GrantedIdentity::new(profile);
        assert_eq!(granted.authorities, vec!["ROLE_A", "ROLE_B"]);
        assert_eq!(granted.username(), "alice");
    }
}
