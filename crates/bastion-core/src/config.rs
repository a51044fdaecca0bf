//! Configuration for Bastion
//!
//! Example:
//! ```toml
//! [ldap]
//! server_url = "ldaps://ldap.example.com:636"
//! bind_dn = "cn=service,dc=example,dc=com"
//! bind_password = "secret"
//! user_base_dn = "ou=people,dc=example,dc=com"
//!
//! [admin]
//! allowed_roles = ["ROLE_ADMIN"]
//!
//! [[generators]]
//! type = "attribute_roles"
//! attribute = "memberOf"
//! mappings = { "cn=admins,ou=groups,dc=example,dc=com" = ["ROLE_ADMIN"] }
//! ```

use crate::types::Secret;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BastionConfig {
    #[serde(default)]
    pub ldap: DirectoryConfig,

    #[serde(default)]
    pub admin: AdminPolicy,

    /// Authorization generators, applied in this order
    #[serde(default)]
    pub generators: Vec<GeneratorConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BastionConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::ConfigRead(format!("{}: {}", path, e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::ConfigParse(e.to_string()))
    }

    /// Overlay `BASTION_*` environment variables on top of the loaded values.
    ///
    /// Returns a notice for every variable that was set but ignored. These run
    /// before logging is configured, so the caller reports them.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ignored = Vec::new();

        if let Some(url) = lookup("BASTION_LDAP_URL") {
            self.ldap.server_url = url;
        }
        if let Some(dn) = lookup("BASTION_LDAP_BIND_DN") {
            self.ldap.bind_dn = dn;
        }
        if let Some(password) = lookup("BASTION_LDAP_BIND_PASSWORD") {
            self.ldap.bind_password = Secret::new(password);
        }
        if let Some(base) = lookup("BASTION_LDAP_USER_BASE_DN") {
            self.ldap.user_base_dn = base;
        }
        if let Some(roles) = lookup("BASTION_ADMIN_ROLES") {
            self.admin.allowed_roles = roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(level) = lookup("BASTION_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("BASTION_LOG_FORMAT") {
            match format.as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "pretty" => self.logging.format = LogFormat::Pretty,
                other => {
                    ignored.push(format!("Ignoring unknown BASTION_LOG_FORMAT: {}", other))
                }
            }
        }

        ignored
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.ldap.validate().map_err(crate::Error::InvalidConfig)?;

        for (index, generator) in self.generators.iter().enumerate() {
            generator.validate().map_err(|e| {
                crate::Error::InvalidConfig(format!(
                    "generator #{} ({}): {}",
                    index + 1,
                    generator.kind(),
                    e
                ))
            })?;
        }

        if self.admin.allowed_roles.is_empty() {
            warn!("No admin roles configured; every authentication will be denied");
        }

        Ok(())
    }
}

// ============================================================================
// Directory
// ============================================================================

/// How the user's entry is located and the password verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationType {
    /// Bind as the service account, search for the user, then bind as the user
    #[default]
    Authenticated,
    /// Search anonymously, then bind as the user
    Anonymous,
    /// Build the user DN from `dn_format` and bind directly
    Direct,
}

/// LDAP server type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LdapServerType {
    /// Generic LDAP server
    #[default]
    Ldap,
    /// Microsoft Active Directory
    ActiveDirectory,
    /// OpenLDAP
    OpenLdap,
    /// 389 Directory Server
    Directory389,
}

impl LdapServerType {
    /// Get default user filter for this server type
    pub fn default_user_filter(&self) -> &'static str {
        match self {
            LdapServerType::ActiveDirectory => "(sAMAccountName={username})",
            _ => "(uid={username})",
        }
    }

    /// Get default group filter for this server type
    pub fn default_group_filter(&self) -> &'static str {
        match self {
            LdapServerType::ActiveDirectory => "(member={dn})",
            _ => "(memberUid={username})",
        }
    }
}

/// Directory connection and lookup settings
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// LDAP server URL (ldap:// or ldaps://)
    #[serde(default = "default_ldap_url")]
    pub server_url: String,

    /// Use STARTTLS for connection upgrade
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    #[serde(default)]
    pub auth_type: AuthenticationType,

    /// Service account DN, used by `authenticated` searches and group lookups
    #[serde(default)]
    pub bind_dn: String,

    #[serde(default)]
    pub bind_password: Secret,

    /// Base DN for user searches
    #[serde(default)]
    pub user_base_dn: String,

    /// User search filter, `{username}` is substituted
    #[serde(default)]
    pub user_filter: Option<String>,

    /// DN template for `direct` binds, e.g. "uid={username},ou=people,dc=example,dc=com"
    #[serde(default)]
    pub dn_format: Option<String>,

    /// Accept empty passwords (the directory sees an unauthenticated bind)
    #[serde(default)]
    pub allow_empty_password: bool,

    /// Upper bound for the whole bind/search exchange
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub server_type: LdapServerType,
}

fn default_ldap_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            server_url: default_ldap_url(),
            start_tls: false,
            skip_tls_verify: false,
            auth_type: AuthenticationType::default(),
            bind_dn: String::new(),
            bind_password: Secret::default(),
            user_base_dn: String::new(),
            user_filter: None,
            dn_format: None,
            allow_empty_password: false,
            timeout_seconds: default_timeout(),
            server_type: LdapServerType::default(),
        }
    }
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Effective user filter, falling back to the server type default
    pub fn user_filter(&self) -> &str {
        self.user_filter
            .as_deref()
            .unwrap_or_else(|| self.server_type.default_user_filter())
    }

    /// Build user search filter. `username` must already be filter-escaped.
    pub fn build_user_filter(&self, username: &str) -> String {
        self.user_filter().replace("{username}", username)
    }

    /// Build a bind DN for direct binds. `username` must already be DN-escaped.
    pub fn build_user_dn(&self, username: &str) -> Option<String> {
        self.dn_format
            .as_ref()
            .map(|f| f.replace("{username}", username))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server_url.is_empty() {
            return Err("Server URL is required".to_string());
        }

        if !self.server_url.starts_with("ldap://") && !self.server_url.starts_with("ldaps://") {
            return Err("Server URL must start with ldap:// or ldaps://".to_string());
        }

        if self.start_tls && self.server_url.starts_with("ldaps://") {
            return Err("STARTTLS cannot be combined with an ldaps:// URL".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("Timeout must be at least one second".to_string());
        }

        match self.auth_type {
            AuthenticationType::Direct => {
                let format = self
                    .dn_format
                    .as_deref()
                    .ok_or_else(|| "DN format is required for direct binds".to_string())?;
                if !format.contains("{username}") {
                    return Err("DN format must contain {username} placeholder".to_string());
                }
            }
            AuthenticationType::Authenticated | AuthenticationType::Anonymous => {
                if self.auth_type == AuthenticationType::Authenticated && self.bind_dn.is_empty() {
                    return Err("Bind DN is required".to_string());
                }
                if self.user_base_dn.is_empty() {
                    return Err("User base DN is required".to_string());
                }
                if !self.user_filter().contains("{username}") {
                    return Err("User filter must contain {username} placeholder".to_string());
                }
            }
        }

        Ok(())
    }

    /// Create configuration from server type with sensible defaults
    pub fn from_server_type(server_type: LdapServerType, server_url: &str) -> Self {
        Self {
            server_url: server_url.to_string(),
            server_type,
            ..Default::default()
        }
    }
}

// ============================================================================
// Admin policy
// ============================================================================

/// Roles admitted to the administrative surface
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminPolicy {
    #[serde(default)]
    pub allowed_roles: BTreeSet<String>,
}

impl Default for AdminPolicy {
    fn default() -> Self {
        Self {
            allowed_roles: BTreeSet::from(["ROLE_ADMIN".to_string()]),
        }
    }
}

impl AdminPolicy {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Authorization generators
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorConfig {
    /// Derive roles from the values of one profile attribute
    AttributeRoles {
        attribute: String,
        #[serde(default)]
        mappings: HashMap<String, Vec<String>>,
        /// Unmapped values become `prefix + VALUE` when set
        #[serde(default)]
        role_prefix: Option<String>,
    },

    /// Derive roles from the user's group memberships in the directory
    GroupRoles {
        base_dn: String,
        /// Defaults to the server type's group filter; `{dn}` and `{username}` are substituted
        #[serde(default)]
        filter: Option<String>,
        #[serde(default = "default_group_name_attr")]
        name_attribute: String,
        #[serde(default)]
        mappings: HashMap<String, Vec<String>>,
        #[serde(default = "default_role_prefix")]
        role_prefix: Option<String>,
        #[serde(default = "default_group_timeout")]
        timeout_seconds: u64,
    },

    /// Grant fixed roles to every authenticated identity
    StaticRoles { roles: Vec<String> },

    Noop,
}

fn default_group_name_attr() -> String {
    "cn".to_string()
}

fn default_role_prefix() -> Option<String> {
    Some("ROLE_".to_string())
}

fn default_group_timeout() -> u64 {
    5
}

impl GeneratorConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorConfig::AttributeRoles { .. } => "attribute_roles",
            GeneratorConfig::GroupRoles { .. } => "group_roles",
            GeneratorConfig::StaticRoles { .. } => "static_roles",
            GeneratorConfig::Noop => "noop",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            GeneratorConfig::AttributeRoles {
                attribute,
                mappings,
                role_prefix,
            } => {
                if attribute.is_empty() {
                    return Err("attribute is required".to_string());
                }
                if mappings.is_empty() && role_prefix.is_none() {
                    return Err("either mappings or role_prefix is required".to_string());
                }
            }
            GeneratorConfig::GroupRoles {
                base_dn,
                filter,
                name_attribute,
                timeout_seconds,
                ..
            } => {
                if base_dn.is_empty() {
                    return Err("base_dn is required".to_string());
                }
                if let Some(filter) = filter {
                    if !filter.contains("{dn}") && !filter.contains("{username}") {
                        return Err("filter must contain {dn} or {username} placeholder".to_string());
                    }
                }
                if name_attribute.is_empty() {
                    return Err("name_attribute is required".to_string());
                }
                if *timeout_seconds == 0 {
                    return Err("timeout_seconds must be at least one second".to_string());
                }
            }
            GeneratorConfig::StaticRoles { roles } => {
                if roles.is_empty() {
                    return Err("roles must not be empty".to_string());
                }
            }
            GeneratorConfig::Noop => {}
        }

        Ok(())
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
