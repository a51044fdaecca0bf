//! LDAP Client implementation
//!
//! Verifies credentials with a search-then-bind or a direct bind, and reads the
//! user's entry with all of its attributes. Supports LDAP, LDAPS (SSL) and
//! STARTTLS connections.

use crate::directory::{BindResponse, DirectoryClient, RejectReason};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bastion_core::config::{AuthenticationType, DirectoryConfig};
use bastion_core::types::{DirectoryEntry, Secret};
use ldap3::{dn_escape, ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use serde::Serialize;
use tracing::debug;

const RC_SUCCESS: u32 = 0;
const RC_CONSTRAINT_VIOLATION: u32 = 19;
const RC_INVALID_CREDENTIALS: u32 = 49;
const RC_INSUFFICIENT_ACCESS: u32 = 50;
const RC_UNWILLING_TO_PERFORM: u32 = 53;

/// All user attributes plus operational ones such as `memberOf`
const RETURN_ATTRIBUTES: [&str; 2] = ["*", "+"];

/// LDAP server information
#[derive(Debug, Clone, Serialize)]
pub struct LdapServerInfo {
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub naming_contexts: Vec<String>,
    pub supported_ldap_version: Vec<String>,
}

/// [`DirectoryClient`] talking to a real LDAP server
pub struct LdapDirectoryClient {
    config: DirectoryConfig,
}

impl LdapDirectoryClient {
    pub fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Bind with the service account (anonymously if none is configured) and
    /// read the root DSE.
    pub async fn test_connection(&self) -> Result<LdapServerInfo, String> {
        let timeout = self.config.timeout();

        tokio::time::timeout(timeout, self.query_root_dse())
            .await
            .map_err(|_| {
                format!(
                    "LDAP server {} did not answer within {:?}",
                    self.config.server_url, timeout
                )
            })?
    }

    async fn query_root_dse(&self) -> Result<LdapServerInfo, String> {
        let mut ldap = connect(&self.config).await?;

        if !self.config.bind_dn.is_empty() {
            service_bind(&mut ldap, &self.config).await?;
        }

        let (rs, _res) = ldap
            .search(
                "",
                Scope::Base,
                "(objectClass=*)",
                vec![
                    "vendorName",
                    "vendorVersion",
                    "namingContexts",
                    "supportedLDAPVersion",
                ],
            )
            .await
            .map_err(|e| format!("Root DSE query failed: {}", e))?
            .success()
            .map_err(|e| format!("Root DSE error: {}", e))?;

        let _ = ldap.unbind().await;

        let info = match rs.into_iter().next() {
            Some(result) => {
                let entry = SearchEntry::construct(result);
                LdapServerInfo {
                    vendor: first_attr(&entry, "vendorName"),
                    version: first_attr(&entry, "vendorVersion"),
                    naming_contexts: entry
                        .attrs
                        .get("namingContexts")
                        .cloned()
                        .unwrap_or_default(),
                    supported_ldap_version: entry
                        .attrs
                        .get("supportedLDAPVersion")
                        .cloned()
                        .unwrap_or_default(),
                }
            }
            None => LdapServerInfo {
                vendor: None,
                version: None,
                naming_contexts: vec![],
                supported_ldap_version: vec!["3".to_string()],
            },
        };

        Ok(info)
    }

    async fn exchange(&self, username: &str, secret: &Secret) -> Result<BindResponse, String> {
        match self.config.auth_type {
            AuthenticationType::Direct => self.direct_bind(username, secret).await,
            AuthenticationType::Authenticated | AuthenticationType::Anonymous => {
                self.search_then_bind(username, secret).await
            }
        }
    }

    async fn search_then_bind(
        &self,
        username: &str,
        secret: &Secret,
    ) -> Result<BindResponse, String> {
        // Step 1: locate the entry, as the service account or anonymously
        let mut ldap = connect(&self.config).await?;

        if self.config.auth_type == AuthenticationType::Authenticated {
            service_bind(&mut ldap, &self.config).await?;
        }

        let filter = self.config.build_user_filter(&ldap_escape(username));
        debug!("Searching for user with filter: {}", filter);

        let (rs, _res) = ldap
            .search(
                &self.config.user_base_dn,
                Scope::Subtree,
                &filter,
                RETURN_ATTRIBUTES.to_vec(),
            )
            .await
            .map_err(|e| format!("User search failed: {}", e))?
            .success()
            .map_err(|e| format!("User search error: {}", e))?;

        let _ = ldap.unbind().await;

        let selected =
            select_entry(rs).map_err(|e| format!("User filter {} {}", filter, e))?;

        let entry = match selected {
            Some(result) => SearchEntry::construct(result),
            None => return Ok(BindResponse::Rejected(RejectReason::UnknownUser)),
        };

        debug!("Found user DN: {}", entry.dn);

        // Step 2: verify the password by binding as the user
        let mut user_ldap = connect(&self.config).await?;

        let user_bind = user_ldap
            .simple_bind(&entry.dn, secret.expose())
            .await
            .map_err(|e| format!("User bind failed: {}", e))?;

        let _ = user_ldap.unbind().await;

        Ok(match classify_bind(user_bind.rc)? {
            Some(reason) => BindResponse::Rejected(reason),
            None => BindResponse::Success(to_directory_entry(entry)),
        })
    }

    async fn direct_bind(&self, username: &str, secret: &Secret) -> Result<BindResponse, String> {
        let user_dn = self
            .config
            .build_user_dn(&dn_escape(username))
            .ok_or_else(|| "DN format is required for direct binds".to_string())?;

        let mut ldap = connect(&self.config).await?;

        let user_bind = ldap
            .simple_bind(&user_dn, secret.expose())
            .await
            .map_err(|e| format!("User bind failed: {}", e))?;

        if let Some(reason) = classify_bind(user_bind.rc)? {
            let _ = ldap.unbind().await;
            return Ok(BindResponse::Rejected(reason));
        }

        // Read our own entry with the user's privileges
        let (rs, _res) = ldap
            .search(
                &user_dn,
                Scope::Base,
                "(objectClass=*)",
                RETURN_ATTRIBUTES.to_vec(),
            )
            .await
            .map_err(|e| format!("Entry read failed: {}", e))?
            .success()
            .map_err(|e| format!("Entry read error: {}", e))?;

        let _ = ldap.unbind().await;

        let entry = match rs.into_iter().next() {
            Some(result) => to_directory_entry(SearchEntry::construct(result)),
            None => DirectoryEntry::new(user_dn, std::iter::empty()),
        };

        Ok(BindResponse::Success(entry))
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectoryClient {
    async fn bind(&self, username: &str, secret: &Secret) -> BindResponse {
        let timeout = self.config.timeout();

        match tokio::time::timeout(timeout, self.exchange(username, secret)).await {
            Ok(Ok(response)) => response,
            Ok(Err(fault)) => BindResponse::Fault(fault),
            Err(_) => BindResponse::Fault(format!(
                "LDAP server {} did not answer within {:?}",
                self.config.server_url, timeout
            )),
        }
    }
}

/// Create LDAP connection with proper TLS settings
pub(crate) async fn connect(config: &DirectoryConfig) -> Result<Ldap, String> {
    let settings = LdapConnSettings::new()
        .set_conn_timeout(config.timeout())
        .set_starttls(config.start_tls)
        .set_no_tls_verify(config.skip_tls_verify);

    debug!("Connecting to LDAP server: {}", config.server_url);

    let (conn, ldap) = LdapConnAsync::with_settings(settings, &config.server_url)
        .await
        .map_err(|e| format!("Failed to connect to LDAP server: {}", e))?;

    ldap3::drive!(conn);

    Ok(ldap)
}

/// Bind with the configured service account
pub(crate) async fn service_bind(ldap: &mut Ldap, config: &DirectoryConfig) -> Result<(), String> {
    let result = ldap
        .simple_bind(&config.bind_dn, config.bind_password.expose())
        .await
        .map_err(|e| format!("Service bind failed: {}", e))?;

    check_service_bind(result.rc)
}

/// Any refusal of the service account is a configuration fault, never a
/// verdict on the user.
fn check_service_bind(rc: u32) -> Result<(), String> {
    match rc {
        RC_SUCCESS => Ok(()),
        rc => Err(format!("Service account bind failed with code: {}", rc)),
    }
}

/// `Ok(None)` on success, `Ok(Some(_))` when the credential was refused and
/// `Err(_)` when the server could not judge it.
///
/// Only credential codes count as a refusal. Protocol, TLS and availability
/// codes (operationsError, confidentialityRequired, busy, ...) are faults.
fn classify_bind(rc: u32) -> Result<Option<RejectReason>, String> {
    match rc {
        RC_SUCCESS => Ok(None),
        RC_INVALID_CREDENTIALS => Ok(Some(RejectReason::InvalidCredentials)),
        RC_UNWILLING_TO_PERFORM => Ok(Some(RejectReason::AccountDisabled)),
        RC_CONSTRAINT_VIOLATION => Ok(Some(RejectReason::AccountLocked)),
        RC_INSUFFICIENT_ACCESS => Ok(Some(RejectReason::Other(rc))),
        other => Err(format!("LDAP bind failed with result code {}", other)),
    }
}

/// Exactly one result identifies the user; none means unknown, more is ambiguous.
fn select_entry<T>(results: Vec<T>) -> Result<Option<T>, String> {
    let mut results = results.into_iter();
    match (results.next(), results.next()) {
        (None, _) => Ok(None),
        (Some(entry), None) => Ok(Some(entry)),
        (Some(_), Some(_)) => Err("matched more than one entry".to_string()),
    }
}

/// Convert a search entry, base64-encoding values that are not valid UTF-8
fn to_directory_entry(entry: SearchEntry) -> DirectoryEntry {
    let binary = entry.bin_attrs.into_iter().map(|(name, values)| {
        let encoded: Vec<String> = values.iter().map(|v| BASE64.encode(v)).collect();
        (name, encoded)
    });

    DirectoryEntry::new(entry.dn, entry.attrs.into_iter().chain(binary))
}

/// Helper to get first attribute value from LDAP entry
pub(crate) fn first_attr(entry: &SearchEntry, attr: &str) -> Option<String> {
    entry.attrs.get(attr).and_then(|v| v.first().cloned())
}
