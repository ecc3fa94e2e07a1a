//! Distinguished name derivation for user entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A distinguished name addressing one directory entry.
///
/// User entry DNs are derived deterministically as
/// `uid=<username>,<user base DN>`. No escaping of special DN characters is
/// performed: usernames containing characters that RFC 4514 requires to be
/// escaped (`,`, `+`, `"`, `\`, `<`, `>`, `;`, `=`, leading `#` or spaces)
/// are a documented limitation of this store, not a handled case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName(String);

impl DistinguishedName {
    /// Derives the entry DN for a username under the given base DN.
    #[must_use]
    pub fn for_user(username: &str, user_base_dn: &str) -> Self {
        Self(format!("uid={username},{user_base_dn}"))
    }

    /// Borrows the distinguished name string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DistinguishedName> for String {
    fn from(value: DistinguishedName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_uid_prefixed_dn() {
        let dn = DistinguishedName::for_user("testuser", "ou=users,ou=system");
        assert_eq!(dn.as_str(), "uid=testuser,ou=users,ou=system");
        assert_eq!(dn.to_string(), "uid=testuser,ou=users,ou=system");
    }

    #[test]
    fn same_username_always_derives_the_same_dn() {
        let base = "ou=people,dc=example,dc=com";
        assert_eq!(
            DistinguishedName::for_user("jdoe", base),
            DistinguishedName::for_user("jdoe", base)
        );
    }

    #[test]
    fn special_characters_pass_through_unescaped() {
        // Escaping is out of scope; the derivation is purely textual.
        let dn = DistinguishedName::for_user("o,dd", "ou=users,ou=system");
        assert_eq!(dn.as_str(), "uid=o,dd,ou=users,ou=system");
    }
}
