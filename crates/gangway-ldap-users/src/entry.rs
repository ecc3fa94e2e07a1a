//! Mapping between directory entries and user records.

use crate::settings::LdapSettings;
use gangway_core::error::Error as CoreError;
use gangway_core::{Authority, User};
use std::collections::HashMap;
use thiserror::Error;

pub(crate) const ATTR_OBJECT_CLASS: &str = "objectClass";
pub(crate) const ATTR_UID: &str = "uid";
pub(crate) const ATTR_CN: &str = "cn";
pub(crate) const ATTR_SN: &str = "sn";
pub(crate) const ATTR_USER_PASSWORD: &str = "userPassword";
pub(crate) const ATTR_UNIX_FILE_PATH: &str = "unixFilePath";
pub(crate) const ATTR_PWD_ATTRIBUTE: &str = "pwdAttribute";
pub(crate) const ATTR_PWD_MAX_IDLE: &str = "pwdMaxIdle";
pub(crate) const ATTR_PWD_LOCKOUT: &str = "pwdLockout";

pub(crate) const OBJECT_CLASS_INET_ORG_PERSON: &str = "inetOrgPerson";
pub(crate) const OBJECT_CLASS_EXTENSIBLE_OBJECT: &str = "extensibleObject";

/// Errors that can occur when translating a directory entry into a user
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// An attribute the mapping requires was absent from the entry.
    #[error("directory entry missing attribute `{0}`")]
    MissingAttribute(String),
    /// An attribute value could not be parsed as an integer.
    #[error("attribute `{attribute}` value `{value}` is not a valid integer")]
    InvalidInteger {
        /// Attribute that failed to parse.
        attribute: String,
        /// Offending value.
        value: String,
    },
    /// An attribute value could not be parsed as a boolean.
    #[error("attribute `{attribute}` value `{value}` is not a valid boolean")]
    InvalidBoolean {
        /// Attribute that failed to parse.
        attribute: String,
        /// Offending value.
        value: String,
    },
}

impl From<MappingError> for CoreError {
    fn from(err: MappingError) -> Self {
        Self::OperationFailed(err.to_string())
    }
}

/// The raw directory-side record for one DN: a mapping from attribute name
/// to one or more string values.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (value order preserved from the server).
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first().map(|value| value.as_str()))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .get(attribute)
            .map(|values| values.as_slice())
    }

    /// Returns the first value of the attribute, or a [`MappingError`] when
    /// the entry does not carry it.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingAttribute`] when the attribute is
    /// absent or empty.
    pub fn require(&self, attribute: &str) -> Result<&str, MappingError> {
        self.first(attribute)
            .ok_or_else(|| MappingError::MissingAttribute(attribute.to_string()))
    }
}

/// Translates a directory entry into a user record.
///
/// The account is enabled exactly when the lockout attribute parses to
/// false. Authorities are synthesized from configuration and never read
/// from the entry.
///
/// # Errors
///
/// Returns a [`MappingError`] when a required attribute is absent or a
/// value does not parse into its expected type.
pub fn map_user(entry: &DirectoryEntry, settings: &LdapSettings) -> Result<User, MappingError> {
    let name = entry.require(ATTR_UID)?;
    let home_directory = entry.require(ATTR_UNIX_FILE_PATH)?;
    let max_idle_time = parse_integer(entry, ATTR_PWD_MAX_IDLE)?;
    let locked_out = parse_boolean(entry, ATTR_PWD_LOCKOUT)?;

    Ok(User::builder(name)
        .home_directory(home_directory)
        .max_idle_time(max_idle_time)
        .enabled(!locked_out)
        .authorities(synthesized_authorities(settings))
        .build())
}

/// Builds the authority set every account carries.
///
/// The set is identical for all users and derived solely from
/// configuration, independent of per-entry directory content.
#[must_use]
pub fn synthesized_authorities(settings: &LdapSettings) -> Vec<Authority> {
    vec![
        Authority::WritePermission,
        Authority::ConcurrentLoginPermission {
            max_concurrent_logins: settings.max_concurrent_logins(),
            max_concurrent_logins_per_ip: settings.max_concurrent_logins_per_ip(),
        },
        Authority::TransferRatePermission {
            download_rate: settings.download_rate(),
            upload_rate: settings.upload_rate(),
        },
    ]
}

/// Builds the write-direction attribute set for a new user entry.
///
/// The password is passed separately because the caller has already
/// verified it is present on the record.
#[must_use]
pub fn user_attributes(user: &User, password: &str) -> Vec<(String, Vec<String>)> {
    vec![
        (
            ATTR_OBJECT_CLASS.to_string(),
            vec![
                OBJECT_CLASS_INET_ORG_PERSON.to_string(),
                OBJECT_CLASS_EXTENSIBLE_OBJECT.to_string(),
            ],
        ),
        (ATTR_CN.to_string(), vec![user.name.clone()]),
        (ATTR_SN.to_string(), vec![user.name.clone()]),
        (ATTR_USER_PASSWORD.to_string(), vec![password.to_string()]),
        // Marker enabling directory-side password-policy attributes.
        (
            ATTR_PWD_ATTRIBUTE.to_string(),
            vec![ATTR_USER_PASSWORD.to_string()],
        ),
        (
            ATTR_UNIX_FILE_PATH.to_string(),
            vec![user.home_directory.clone()],
        ),
        (
            ATTR_PWD_MAX_IDLE.to_string(),
            vec![user.max_idle_time.to_string()],
        ),
        (
            ATTR_PWD_LOCKOUT.to_string(),
            vec![(!user.enabled).to_string()],
        ),
    ]
}

fn parse_integer(entry: &DirectoryEntry, attribute: &str) -> Result<u32, MappingError> {
    let value = entry.require(attribute)?;
    value
        .parse::<u32>()
        .map_err(|_| MappingError::InvalidInteger {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

// Directory servers write boolean syntax as TRUE/FALSE; accept any casing.
fn parse_boolean(entry: &DirectoryEntry, attribute: &str) -> Result<bool, MappingError> {
    let value = entry.require(attribute)?;
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(MappingError::InvalidBoolean {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pairs: &[(&str, &[&str])]) -> DirectoryEntry {
        DirectoryEntry {
            dn: "uid=testuser,ou=users,ou=system".to_string(),
            attributes: pairs
                .iter()
                .map(|(attribute, values)| {
                    (
                        (*attribute).to_string(),
                        values.iter().map(|value| (*value).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    fn sample_entry() -> DirectoryEntry {
        entry(&[
            (ATTR_UID, &["testuser"]),
            (ATTR_UNIX_FILE_PATH, &["/testuser"]),
            (ATTR_PWD_MAX_IDLE, &["1800"]),
            (ATTR_PWD_LOCKOUT, &["FALSE"]),
        ])
    }

    #[test]
    fn maps_entry_to_user() {
        let settings = LdapSettings::default();
        let user = map_user(&sample_entry(), &settings).unwrap();

        assert_eq!(user.name, "testuser");
        assert_eq!(user.home_directory, "/testuser");
        assert_eq!(user.max_idle_time, 1800);
        assert!(user.enabled);
        assert!(user.password.is_none());
    }

    #[test]
    fn enabled_is_the_negated_lockout_flag() {
        let settings = LdapSettings::default();

        let mut locked = sample_entry();
        locked
            .attributes
            .insert(ATTR_PWD_LOCKOUT.to_string(), vec!["true".to_string()]);
        assert!(!map_user(&locked, &settings).unwrap().enabled);
    }

    #[test]
    fn authorities_come_from_configuration_not_the_entry() {
        let settings = LdapSettings::default()
            .with_login_limits(5, 3)
            .with_transfer_rates(Some(2048), Some(1024));
        let user = map_user(&sample_entry(), &settings).unwrap();

        assert_eq!(
            user.authorities,
            vec![
                Authority::WritePermission,
                Authority::ConcurrentLoginPermission {
                    max_concurrent_logins: 5,
                    max_concurrent_logins_per_ip: 3,
                },
                Authority::TransferRatePermission {
                    download_rate: Some(2048),
                    upload_rate: Some(1024),
                },
            ]
        );
    }

    #[test]
    fn missing_required_attribute_is_a_mapping_error() {
        let settings = LdapSettings::default();
        let mut incomplete = sample_entry();
        incomplete.attributes.remove(ATTR_UNIX_FILE_PATH);

        assert_eq!(
            map_user(&incomplete, &settings),
            Err(MappingError::MissingAttribute(
                ATTR_UNIX_FILE_PATH.to_string()
            ))
        );
    }

    #[test]
    fn unparsable_idle_timeout_is_a_mapping_error() {
        let settings = LdapSettings::default();
        let mut broken = sample_entry();
        broken
            .attributes
            .insert(ATTR_PWD_MAX_IDLE.to_string(), vec!["soon".to_string()]);

        assert!(matches!(
            map_user(&broken, &settings),
            Err(MappingError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn unparsable_lockout_flag_is_a_mapping_error() {
        let settings = LdapSettings::default();
        let mut broken = sample_entry();
        broken
            .attributes
            .insert(ATTR_PWD_LOCKOUT.to_string(), vec!["maybe".to_string()]);

        assert!(matches!(
            map_user(&broken, &settings),
            Err(MappingError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn mapping_error_converts_to_operation_failed() {
        let err: CoreError = MappingError::MissingAttribute(ATTR_UID.to_string()).into();
        assert!(matches!(err, CoreError::OperationFailed(_)));
    }

    #[test]
    fn write_direction_attribute_set() {
        let user = User::builder("newuser")
            .password("hunter2")
            .home_directory("/newuser")
            .max_idle_time(600)
            .enabled(false)
            .build();

        let attributes = user_attributes(&user, "hunter2");
        let lookup: HashMap<_, _> = attributes.iter().cloned().collect();

        assert_eq!(
            lookup[ATTR_OBJECT_CLASS],
            vec![
                OBJECT_CLASS_INET_ORG_PERSON.to_string(),
                OBJECT_CLASS_EXTENSIBLE_OBJECT.to_string(),
            ]
        );
        assert_eq!(lookup[ATTR_CN], vec!["newuser".to_string()]);
        assert_eq!(lookup[ATTR_SN], vec!["newuser".to_string()]);
        assert_eq!(lookup[ATTR_USER_PASSWORD], vec!["hunter2".to_string()]);
        assert_eq!(
            lookup[ATTR_PWD_ATTRIBUTE],
            vec![ATTR_USER_PASSWORD.to_string()]
        );
        assert_eq!(lookup[ATTR_UNIX_FILE_PATH], vec!["/newuser".to_string()]);
        assert_eq!(lookup[ATTR_PWD_MAX_IDLE], vec!["600".to_string()]);
        assert_eq!(lookup[ATTR_PWD_LOCKOUT], vec!["true".to_string()]);
    }

    #[test]
    fn entry_accessors() {
        let entry = sample_entry();
        assert_eq!(entry.first(ATTR_UID), Some("testuser"));
        assert_eq!(
            entry.values(ATTR_UID),
            Some(["testuser".to_string()].as_slice())
        );
        assert_eq!(entry.first("mail"), None);
        assert!(entry.require("mail").is_err());
    }
}
