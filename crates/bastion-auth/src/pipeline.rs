//! Authenticate-then-authorize pipeline
//!
//! One pass per request, strictly forward:
//!
//! ```text
//! verify --ok--> build profile --> generate --ok--> authorize --> Granted | Denied
//!        --rejected--> Denied(NotAuthenticated)
//!        --fault--> Error(DirectoryFault)
//!                                  generate --err--> Error(Generator)
//! ```

use crate::authorizer::RequireAnyRoleAuthorizer;
use crate::directory::{DirectoryAuthenticator, DirectoryClient};
use crate::generator::{build_generators, AuthorizationGenerator};
use crate::ldap::LdapDirectoryClient;
use crate::profile::build_profile;
use bastion_core::config::{AdminPolicy, BastionConfig};
use bastion_core::types::{
    AuthorizationOutcome, Credential, Denial, GrantedIdentity, IdentityProfile, RequestContext,
    Secret,
};
use bastion_core::{AuthenticationError, DirectoryError, GeneratorError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Admin gate shared by all requests
#[derive(Clone)]
pub struct AuthenticationPipeline {
    authenticator: DirectoryAuthenticator,
    generators: Vec<Arc<dyn AuthorizationGenerator>>,
    authorizer: RequireAnyRoleAuthorizer,
}

impl AuthenticationPipeline {
    pub fn new(
        authenticator: DirectoryAuthenticator,
        generators: Vec<Arc<dyn AuthorizationGenerator>>,
        policy: Arc<AdminPolicy>,
    ) -> Self {
        Self {
            authenticator,
            generators,
            authorizer: RequireAnyRoleAuthorizer::new(policy),
        }
    }

    /// Pipeline over an arbitrary directory client, without generators
    pub fn with_client(client: Arc<dyn DirectoryClient>, policy: Arc<AdminPolicy>) -> Self {
        Self::new(DirectoryAuthenticator::new(client), Vec::new(), policy)
    }

    /// Append a generator; generators run in the order they were added
    pub fn with_generator(mut self, generator: Arc<dyn AuthorizationGenerator>) -> Self {
        self.generators.push(generator);
        self
    }

    /// Assemble the LDAP-backed pipeline described by `config`.
    pub fn from_config(config: &BastionConfig) -> bastion_core::Result<Self> {
        config.validate()?;

        let client = LdapDirectoryClient::new(config.ldap.clone());
        let authenticator = DirectoryAuthenticator::new(Arc::new(client))
            .allow_empty_password(config.ldap.allow_empty_password);
        let generators = build_generators(&config.generators, &config.ldap);

        Ok(Self::new(
            authenticator,
            generators,
            Arc::new(config.admin.clone()),
        ))
    }

    pub fn generator_names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Authenticate and authorize one login attempt.
    pub async fn authenticate(
        &self,
        username: &str,
        secret: impl Into<Secret>,
    ) -> AuthorizationOutcome {
        let credential = Credential::new(username, secret);
        self.authenticate_with_context(&RequestContext::new(), &credential)
            .await
    }

    pub async fn authenticate_with_context(
        &self,
        context: &RequestContext,
        credential: &Credential,
    ) -> AuthorizationOutcome {
        let username = credential.username();
        debug!(
            "Preparing authentication request {} for user [{}]",
            context.request_id, username
        );

        let entry = match self.authenticator.verify(credential).await {
            Ok(entry) => entry,
            Err(DirectoryError::NotAuthenticated) => {
                warn!("Authentication produced no match for [{}]", username);
                return AuthorizationOutcome::Denied(Denial::NotAuthenticated);
            }
            Err(DirectoryError::Fault(cause)) => {
                return AuthorizationOutcome::Error(AuthenticationError::DirectoryFault(cause));
            }
        };

        let mut profile = build_profile(username, &entry);
        debug!("Collected user profile [{:?}]", profile);

        if let Err(e) = self.generate(context, &mut profile).await {
            error!(
                "Authorization generation failed for [{}] (request {}): {}",
                username, context.request_id, e
            );
            return AuthorizationOutcome::Error(e.into());
        }
        debug!(
            "Assembled user profile with roles after generating authorization claims [{:?}]",
            profile.roles()
        );

        if self.authorizer.is_authorized(&profile) {
            info!("User [{}] authorized with roles {:?}", username, profile.roles());
            return AuthorizationOutcome::Granted(GrantedIdentity::new(profile));
        }

        warn!(
            "User [{}] is not authorized; allowed roles are {:?}",
            username,
            self.authorizer.allowed_roles()
        );
        AuthorizationOutcome::Denied(Denial::InsufficientRole)
    }

    async fn generate(
        &self,
        context: &RequestContext,
        profile: &mut IdentityProfile,
    ) -> Result<(), GeneratorError> {
        for generator in &self.generators {
            generator.generate(context, profile).await?;
            debug!(
                "Generator [{}] left [{}] with {} roles",
                generator.name(),
                profile.id(),
                profile.roles().len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{
        AttributeRolesGenerator, GroupRolesGenerator, RoleMapping, StaticRolesGenerator,
    };
    use crate::testing::{StaticDirectory, StaticGroups};
    use async_trait::async_trait;
    use std::time::Duration;

    fn alice_directory() -> StaticDirectory {
        StaticDirectory::new().with_user("alice", "correct", &[("memberOf", &["admins"][..])])
    }

    fn admins_mapper() -> Arc<dyn AuthorizationGenerator> {
        Arc::new(AttributeRolesGenerator::new(
            "memberOf",
            RoleMapping::explicit([("admins", vec!["ROLE_ADMIN"])]),
        ))
    }

    fn pipeline(directory: StaticDirectory, allowed: &[&str]) -> AuthenticationPipeline {
        AuthenticationPipeline::with_client(
            Arc::new(directory),
            Arc::new(AdminPolicy::new(allowed.iter().copied())),
        )
        .with_generator(admins_mapper())
    }

    #[tokio::test]
    async fn test_admin_is_granted() {
        let outcome = pipeline(alice_directory(), &["ROLE_ADMIN"])
            .authenticate("alice", "correct")
            .await;

        let identity = outcome.identity().expect("granted");
        assert_eq!(identity.username(), "alice");
        assert_eq!(identity.authorities, vec!["ROLE_ADMIN"]);
        assert_eq!(
            identity.profile.attribute("memberOf"),
            Some(&["admins".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_missing_admin_role_is_denied() {
        let outcome = pipeline(alice_directory(), &["ROLE_SUPERUSER"])
            .authenticate("alice", "correct")
            .await;

        assert_eq!(outcome, AuthorizationOutcome::Denied(Denial::InsufficientRole));
    }

    /// Fails the test if the pipeline ever reaches generation
    struct MustNotRun;

    #[async_trait]
    impl AuthorizationGenerator for MustNotRun {
        fn name(&self) -> &str {
            "must_not_run"
        }

        async fn generate(
            &self,
            _context: &RequestContext,
            _profile: &mut IdentityProfile,
        ) -> Result<(), GeneratorError> {
            panic!("profile must not be built for rejected credentials");
        }
    }

    #[tokio::test]
    async fn test_wrong_password_is_not_authenticated() {
        let directory = StaticDirectory::new().with_user("bob", "right", &[]);
        let outcome = pipeline(directory, &["ROLE_ADMIN"])
            .with_generator(Arc::new(MustNotRun))
            .authenticate("bob", "wrong")
            .await;

        assert_eq!(outcome, AuthorizationOutcome::Denied(Denial::NotAuthenticated));
        assert_eq!(outcome.code(), "NotAuthenticated");
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_a_fault() {
        let directory = alice_directory().unreachable("connection refused");
        let outcome = pipeline(directory, &["ROLE_ADMIN"])
            .authenticate("alice", "correct")
            .await;

        assert_eq!(
            outcome,
            AuthorizationOutcome::Error(AuthenticationError::DirectoryFault(
                "connection refused".to_string()
            ))
        );
        assert_ne!(
            outcome.code(),
            AuthorizationOutcome::Denied(Denial::NotAuthenticated).code()
        );
    }

    #[tokio::test]
    async fn test_policy_lookup_timeout_is_an_error() {
        let groups = StaticGroups::new()
            .with_groups("alice", &["admin"])
            .delayed(Duration::from_secs(30));
        let outcome = pipeline(alice_directory(), &["ROLE_ADMIN"])
            .with_generator(Arc::new(GroupRolesGenerator::new(
                Arc::new(groups),
                RoleMapping::prefixed("ROLE_"),
                Duration::from_millis(20),
            )))
            .authenticate("alice", "correct")
            .await;

        match outcome {
            AuthorizationOutcome::Error(AuthenticationError::Generator(e)) => {
                assert_eq!(e.generator, "group_roles");
            }
            other => panic!("expected generator error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generator_failure_after_granting_role_is_still_an_error() {
        // The first generator alone would grant access; the failing one must win.
        let groups = StaticGroups::new().failing("policy service unreachable");
        let outcome = pipeline(alice_directory(), &["ROLE_ADMIN"])
            .with_generator(Arc::new(GroupRolesGenerator::new(
                Arc::new(groups),
                RoleMapping::prefixed("ROLE_"),
                Duration::from_secs(1),
            )))
            .authenticate("alice", "correct")
            .await;

        assert_eq!(outcome.code(), "GeneratorError");
    }

    /// Records the roles it observed, then adds one of its own
    struct Observer {
        seen: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuthorizationGenerator for Observer {
        fn name(&self) -> &str {
            "observer"
        }

        async fn generate(
            &self,
            _context: &RequestContext,
            profile: &mut IdentityProfile,
        ) -> Result<(), GeneratorError> {
            *self.seen.lock().unwrap() = profile.roles().iter().cloned().collect();
            profile.add_role("ROLE_OBSERVED");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_generators_run_in_order_and_roles_grow() {
        let observer = Arc::new(Observer {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let outcome = pipeline(alice_directory(), &["ROLE_OBSERVED"])
            .with_generator(Arc::new(StaticRolesGenerator::new(["ROLE_USER"])))
            .with_generator(observer.clone())
            .authenticate("alice", "correct")
            .await;

        assert_eq!(
            *observer.seen.lock().unwrap(),
            vec!["ROLE_ADMIN".to_string(), "ROLE_USER".to_string()]
        );
        let identity = outcome.identity().expect("granted");
        assert_eq!(
            identity.authorities,
            vec!["ROLE_ADMIN", "ROLE_OBSERVED", "ROLE_USER"]
        );
    }

    #[tokio::test]
    async fn test_empty_allow_list_denies_admins() {
        let outcome = pipeline(alice_directory(), &[])
            .authenticate("alice", "correct")
            .await;

        assert_eq!(outcome, AuthorizationOutcome::Denied(Denial::InsufficientRole));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_idempotent() {
        let pipeline = pipeline(alice_directory(), &["ROLE_ADMIN"]);

        for (password, expected) in [("correct", "Granted"), ("nope", "NotAuthenticated")] {
            let first = pipeline.authenticate("alice", password).await;
            let second = pipeline.authenticate("alice", password).await;
            assert_eq!(first, second);
            assert_eq!(first.code(), expected);
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_pipeline() {
        let pipeline = Arc::new(pipeline(
            alice_directory().with_user("carol", "pw", &[("memberOf", &["staff"][..])]),
            &["ROLE_ADMIN"],
        ));

        let mut handles = Vec::new();
        for i in 0..16 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    pipeline.authenticate("alice", "correct").await.code()
                } else {
                    pipeline.authenticate("carol", "pw").await.code()
                }
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let code = handle.await.unwrap();
            assert_eq!(code, if i % 2 == 0 { "Granted" } else { "Denied" });
        }
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = BastionConfig::default();
        assert!(AuthenticationPipeline::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_builds_generators_in_order() {
        let config = BastionConfig::from_toml(
            r#"
            [ldap]
            bind_dn = "cn=service,dc=example,dc=com"
            user_base_dn = "ou=people,dc=example,dc=com"

            [[generators]]
            type = "static_roles"
            roles = ["ROLE_USER"]

            [[generators]]
            type = "attribute_roles"
            attribute = "memberOf"
            role_prefix = "ROLE_"
            "#,
        )
        .unwrap();

        let pipeline = AuthenticationPipeline::from_config(&config).unwrap();
        assert_eq!(
            pipeline.generator_names(),
            vec!["static_roles", "attribute_roles"]
        );
    }
}
