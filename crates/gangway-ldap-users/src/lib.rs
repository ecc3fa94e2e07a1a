//! LDAP-backed account store for the gangway file-transfer service.
//!
//! User accounts are persisted as entries in an LDAP directory under a
//! configured base DN. This crate provides the settings resolver, the
//! entry/record mapping, a managed connection pool, and the
//! [`LdapUserManager`] facade implementing the
//! [`UserManager`](gangway_core::UserManager) capability the hosting
//! service depends on.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod dn;
mod entry;
mod manager;
mod pool;
pub mod settings;

pub use dn::DistinguishedName;
pub use entry::{map_user, synthesized_authorities, user_attributes, DirectoryEntry, MappingError};
pub use manager::LdapUserManager;
pub use settings::{LdapSettings, SettingsSource};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = gangway_core::Result<T>;
