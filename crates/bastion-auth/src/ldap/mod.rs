//! LDAP/Active Directory integration
//!
//! Provides:
//! - Credential verification (search-then-bind or direct bind)
//! - Group lookups for role derivation
//! - Connection testing
//! - TLS/STARTTLS support

mod client;
mod groups;

pub use client::{LdapDirectoryClient, LdapServerInfo};
pub use groups::LdapGroupSource;
