//! Mapping of directory entries into identity profiles

use bastion_core::types::{DirectoryEntry, IdentityProfile};

/// Build the profile for an authenticated user.
///
/// The id is the username as submitted, not the directory's canonical name.
/// Every attribute is copied, including ones without values; roles start empty.
pub fn build_profile(username: &str, entry: &DirectoryEntry) -> IdentityProfile {
    let mut profile =
        IdentityProfile::new(username).with_distinguished_name(entry.distinguished_name());

    for (name, values) in entry.attributes() {
        profile.add_attribute(name.clone(), values.iter().cloned());
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::entry;

    #[test]
    fn test_profile_keeps_submitted_username() {
        let entry = DirectoryEntry::new(
            "uid=Alice,ou=people,dc=example,dc=com",
            [("uid".to_string(), vec!["Alice".to_string()])],
        );

        let profile = build_profile("alice", &entry);

        assert_eq!(profile.id(), "alice");
        assert_eq!(
            profile.distinguished_name(),
            Some("uid=Alice,ou=people,dc=example,dc=com")
        );
        assert!(profile.roles().is_empty());
    }

    #[test]
    fn test_attributes_copied_verbatim() {
        let entry = entry(
            "alice",
            &[
                ("memberOf", &["admins", "ops"][..]),
                ("description", &[][..]),
            ],
        );

        let profile = build_profile("alice", &entry);

        assert_eq!(profile.attributes(), entry.attributes());
        assert_eq!(profile.attribute("description"), Some(&[][..]));
        assert_eq!(profile.attribute("memberOf").map(|v| v.len()), Some(2));
    }
}
