//! Group membership lookups against LDAP

use super::client::{connect, first_attr, service_bind};
use crate::generator::GroupSource;
use async_trait::async_trait;
use bastion_core::config::DirectoryConfig;
use ldap3::{ldap_escape, Scope, SearchEntry};
use tracing::debug;

/// [`GroupSource`] searching a group subtree for entries that list the user
pub struct LdapGroupSource {
    config: DirectoryConfig,
    base_dn: String,
    filter: String,
    name_attribute: String,
}

impl LdapGroupSource {
    pub fn new(
        config: DirectoryConfig,
        base_dn: impl Into<String>,
        filter: impl Into<String>,
        name_attribute: impl Into<String>,
    ) -> Self {
        Self {
            config,
            base_dn: base_dn.into(),
            filter: filter.into(),
            name_attribute: name_attribute.into(),
        }
    }

    /// Build group search filter with DN/username substitution.
    /// Substituted values are never rescanned for placeholders.
    fn build_filter(&self, user_dn: &str, username: &str) -> String {
        let dn = ldap_escape(user_dn);
        let username = ldap_escape(username);

        let mut filter = String::with_capacity(self.filter.len() + dn.len());
        let mut rest = self.filter.as_str();

        while let Some(start) = rest.find('{') {
            filter.push_str(&rest[..start]);
            let tail = &rest[start..];

            if let Some(after) = tail.strip_prefix("{dn}") {
                filter.push_str(&dn);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{username}") {
                filter.push_str(&username);
                rest = after;
            } else {
                filter.push('{');
                rest = &tail[1..];
            }
        }

        filter.push_str(rest);
        filter
    }
}

#[async_trait]
impl GroupSource for LdapGroupSource {
    async fn groups_for(&self, user_dn: &str, username: &str) -> Result<Vec<String>, String> {
        let mut ldap = connect(&self.config).await?;

        if !self.config.bind_dn.is_empty() {
            service_bind(&mut ldap, &self.config).await?;
        }

        let filter = self.build_filter(user_dn, username);
        debug!("Searching groups with filter: {}", filter);

        let (rs, _res) = ldap
            .search(
                &self.base_dn,
                Scope::Subtree,
                &filter,
                vec![self.name_attribute.as_str()],
            )
            .await
            .map_err(|e| format!("Group search failed: {}", e))?
            .success()
            .map_err(|e| format!("Group search error: {}", e))?;

        let _ = ldap.unbind().await;

        let groups: Vec<String> = rs
            .into_iter()
            .filter_map(|result| first_attr(&SearchEntry::construct(result), &self.name_attribute))
            .collect();

        debug!("Found {} groups for user", groups.len());
        Ok(groups)
    }
}
