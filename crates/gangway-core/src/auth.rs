//! Credential kinds presented at login.

use serde::{Deserialize, Serialize};

/// Credentials presented by a connecting client.
///
/// Only [`Authentication::UsernamePassword`] can be verified against the
/// account store; every other kind is rejected outright by
/// [`UserManager::authenticate`](crate::manager::UserManager::authenticate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Authentication {
    /// A username and plain-text password pair.
    UsernamePassword {
        /// Account name to verify.
        username: String,
        /// Plain-text password, compared as supplied.
        #[serde(skip_serializing)]
        #[serde(default)]
        password: String,
    },
    /// An anonymous login attempt carrying no credentials.
    Anonymous,
}

impl Authentication {
    /// Creates username/password credentials.
    #[must_use]
    pub fn username_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::UsernamePassword {
            username: username.into(),
            password: password.into(),
        }
    }
}
