//! Authentication and authorization for Bastion

pub mod authorizer;
pub mod directory;
pub mod generator;
pub mod ldap;
pub mod pipeline;
pub mod profile;

#[cfg(test)]
mod testing;

pub use authorizer::{authorize, RequireAnyRoleAuthorizer};
pub use directory::{BindResponse, DirectoryAuthenticator, DirectoryClient, RejectReason};
pub use generator::{
    build_generators, AttributeRolesGenerator, AuthorizationGenerator, GroupRolesGenerator,
    GroupSource, NoopGenerator, RoleMapping, StaticRolesGenerator,
};
pub use ldap::{LdapDirectoryClient, LdapGroupSource, LdapServerInfo};
pub use pipeline::AuthenticationPipeline;
pub use profile::build_profile;
