//! User account representation and access authorities.

use serde::{Deserialize, Serialize};

/// A permission or policy capability attached to a user account.
///
/// Authorities are derived from service configuration, never stored per
/// account in the backing directory: every user carries the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Authority {
    /// The user may upload, rename, and delete files.
    WritePermission,
    /// Caps on simultaneous sessions for the user.
    ConcurrentLoginPermission {
        /// Maximum simultaneous sessions across all client addresses.
        max_concurrent_logins: u32,
        /// Maximum simultaneous sessions per client address.
        max_concurrent_logins_per_ip: u32,
    },
    /// Caps on transfer throughput, in bytes per second.
    TransferRatePermission {
        /// Download cap; `None` means unbounded.
        download_rate: Option<u32>,
        /// Upload cap; `None` means unbounded.
        upload_rate: Option<u32>,
    },
}

/// A user account of the file-transfer service.
///
/// Records are owned by the caller and constructed fresh on every read from
/// the backing store; nothing is cached. The password is plain text, stored
/// and compared as supplied, and is `None` on records read back from the
/// directory (the read path never returns it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique account name; the account key.
    pub name: String,
    /// Plain-text password, when known.
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password: Option<String>,
    /// Home directory path presented to the user.
    pub home_directory: String,
    /// Maximum idle time in seconds before the session is dropped.
    pub max_idle_time: u32,
    /// Whether the account may log in.
    pub enabled: bool,
    /// Ordered access authorities.
    pub authorities: Vec<Authority>,
}

impl User {
    /// Creates a builder for a new user instance.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> UserBuilder {
        UserBuilder {
            name: name.into(),
            password: None,
            home_directory: "/".to_string(),
            max_idle_time: 0,
            enabled: true,
            authorities: Vec::new(),
        }
    }

    /// Returns true if the account carries the write permission.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.authorities
            .iter()
            .any(|authority| matches!(authority, Authority::WritePermission))
    }
}

/// Builder for [`User`].
#[derive(Debug)]
pub struct UserBuilder {
    name: String,
    password: Option<String>,
    home_directory: String,
    max_idle_time: u32,
    enabled: bool,
    authorities: Vec<Authority>,
}

impl UserBuilder {
    /// Sets the plain-text password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the home directory path.
    #[must_use]
    pub fn home_directory(mut self, home_directory: impl Into<String>) -> Self {
        self.home_directory = home_directory.into();
        self
    }

    /// Sets the maximum idle time in seconds.
    #[must_use]
    pub const fn max_idle_time(mut self, seconds: u32) -> Self {
        self.max_idle_time = seconds;
        self
    }

    /// Enables or disables the account.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replaces the authority list.
    #[must_use]
    pub fn authorities<I>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = Authority>,
    {
        self.authorities = authorities.into_iter().collect();
        self
    }

    /// Finalises the builder and returns the [`User`].
    #[must_use]
    pub fn build(self) -> User {
        User {
            name: self.name,
            password: self.password,
            home_directory: self.home_directory,
            max_idle_time: self.max_idle_time,
            enabled: self.enabled,
            authorities: self.authorities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_builder_constructs_expected_user() {
        let user = User::builder("jdoe")
            .password("hunter2")
            .home_directory("/srv/jdoe")
            .max_idle_time(1800)
            .enabled(false)
            .authorities([
                Authority::WritePermission,
                Authority::ConcurrentLoginPermission {
                    max_concurrent_logins: 2,
                    max_concurrent_logins_per_ip: 2,
                },
            ])
            .build();

        assert_eq!(user.name, "jdoe");
        assert_eq!(user.password.as_deref(), Some("hunter2"));
        assert_eq!(user.home_directory, "/srv/jdoe");
        assert_eq!(user.max_idle_time, 1800);
        assert!(!user.enabled);
        assert!(user.can_write());
    }

    #[test]
    fn user_builder_defaults() {
        let user = User::builder("jdoe").build();

        assert!(user.password.is_none());
        assert_eq!(user.home_directory, "/");
        assert_eq!(user.max_idle_time, 0);
        assert!(user.enabled);
        assert!(user.authorities.is_empty());
        assert!(!user.can_write());
    }

    #[test]
    fn password_is_not_serialized() {
        let user = User::builder("jdoe").password("hunter2").build();

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("jdoe"));
    }

    #[test]
    fn authority_serialization_round_trip() {
        let authority = Authority::TransferRatePermission {
            download_rate: Some(1_048_576),
            upload_rate: None,
        };

        let json = serde_json::to_string(&authority).unwrap();
        let parsed: Authority = serde_json::from_str(&json).unwrap();
        assert_eq!(authority, parsed);
    }
}
