//! Settings resolution for the LDAP account store.
//!
//! Deployments hand the store an opaque key/value source (properties file,
//! environment bridge, test fixture); resolution turns it into a typed,
//! defaulted, validated [`LdapSettings`] without touching the directory.

use gangway_core::{Error, Result};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Settings key for the directory host.
pub const KEY_CONNECTION_HOST: &str = "connection.host";
/// Settings key for the directory port.
pub const KEY_CONNECTION_PORT: &str = "connection.port";
/// Settings key for the bind identity (a DN).
pub const KEY_CONNECTION_NAME: &str = "connection.name";
/// Settings key for the bind secret.
pub const KEY_CONNECTION_CREDENTIALS: &str = "connection.credentials";
/// Settings key for the round-trip timeout in milliseconds.
pub const KEY_CONNECTION_TIMEOUT: &str = "connection.timeout";
/// Settings key for the connection pool upper bound.
pub const KEY_CONNECTION_MAX_ACTIVE: &str = "connection.max.active";
/// Settings key for the idle-connection cache size.
pub const KEY_CONNECTION_MAX_IDLE: &str = "connection.max.idle";
/// Settings key for the user search/write root.
pub const KEY_USER_BASE_DN: &str = "user.base.dn";
/// Settings key for the global per-user session cap.
pub const KEY_MAX_CONCURRENT_LOGINS: &str = "max.concurrent.logins";
/// Settings key for the per-IP session cap.
pub const KEY_MAX_CONCURRENT_LOGINS_PER_IP: &str = "max.concurrent.logins.per.ip";
/// Settings key for the download rate cap in bytes per second.
pub const KEY_DOWNLOAD_RATE: &str = "download.rate";
/// Settings key for the upload rate cap in bytes per second.
pub const KEY_UPLOAD_RATE: &str = "upload.rate";

/// Default directory host.
pub const DEFAULT_CONNECTION_HOST: &str = "localhost";
/// Default directory port.
pub const DEFAULT_CONNECTION_PORT: u16 = 10389;
/// Default bind identity.
pub const DEFAULT_CONNECTION_NAME: &str = "uid=admin,ou=system";
/// Default bind secret.
pub const DEFAULT_CONNECTION_CREDENTIALS: &str = "secret";
/// Default round-trip timeout (milliseconds).
pub const DEFAULT_CONNECTION_TIMEOUT_MILLIS: u64 = 180_000;
/// Default connection pool upper bound.
pub const DEFAULT_CONNECTION_MAX_ACTIVE: u32 = 200;
/// Default idle-connection cache size.
pub const DEFAULT_CONNECTION_MAX_IDLE: u32 = 20;
/// Default user search/write root.
pub const DEFAULT_USER_BASE_DN: &str = "ou=users,ou=system";
/// Default global per-user session cap.
pub const DEFAULT_MAX_CONCURRENT_LOGINS: u32 = 2;
/// Default per-IP session cap.
pub const DEFAULT_MAX_CONCURRENT_LOGINS_PER_IP: u32 = 2;

/// An opaque key/value settings source.
pub trait SettingsSource {
    /// Returns the raw value for `key`, if the source defines one.
    fn get(&self, key: &str) -> Option<String>;
}

impl SettingsSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Resolved connection and policy parameters for the LDAP account store.
///
/// Every parameter is defaulted independently, so a partial source yields a
/// usable configuration. Instances are immutable once resolved.
#[derive(Debug, Clone, Validate)]
pub struct LdapSettings {
    host: String,
    #[validate(range(min = 1))]
    port: u16,
    bind_dn: String,
    bind_password: String,
    #[validate(range(min = 1))]
    timeout_millis: u64,
    #[validate(range(min = 1))]
    max_active: u32,
    max_idle: u32,
    user_base_dn: String,
    max_concurrent_logins: u32,
    max_concurrent_logins_per_ip: u32,
    download_rate: Option<u32>,
    upload_rate: Option<u32>,
}

impl LdapSettings {
    /// Resolves settings from a key/value source, applying the documented
    /// default for every absent key.
    ///
    /// Resolution is pure: the directory is never contacted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when a present value cannot be parsed
    /// into its expected type, or when the resolved parameters fail
    /// validation.
    pub fn resolve<S: SettingsSource>(source: &S) -> Result<Self> {
        let settings = Self {
            host: source
                .get(KEY_CONNECTION_HOST)
                .unwrap_or_else(|| DEFAULT_CONNECTION_HOST.to_string()),
            port: parse_value(source, KEY_CONNECTION_PORT)?.unwrap_or(DEFAULT_CONNECTION_PORT),
            bind_dn: source
                .get(KEY_CONNECTION_NAME)
                .unwrap_or_else(|| DEFAULT_CONNECTION_NAME.to_string()),
            bind_password: source
                .get(KEY_CONNECTION_CREDENTIALS)
                .unwrap_or_else(|| DEFAULT_CONNECTION_CREDENTIALS.to_string()),
            timeout_millis: parse_value(source, KEY_CONNECTION_TIMEOUT)?
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_MILLIS),
            max_active: parse_value(source, KEY_CONNECTION_MAX_ACTIVE)?
                .unwrap_or(DEFAULT_CONNECTION_MAX_ACTIVE),
            max_idle: parse_value(source, KEY_CONNECTION_MAX_IDLE)?
                .unwrap_or(DEFAULT_CONNECTION_MAX_IDLE),
            user_base_dn: source
                .get(KEY_USER_BASE_DN)
                .unwrap_or_else(|| DEFAULT_USER_BASE_DN.to_string()),
            max_concurrent_logins: parse_value(source, KEY_MAX_CONCURRENT_LOGINS)?
                .unwrap_or(DEFAULT_MAX_CONCURRENT_LOGINS),
            max_concurrent_logins_per_ip: parse_value(source, KEY_MAX_CONCURRENT_LOGINS_PER_IP)?
                .unwrap_or(DEFAULT_MAX_CONCURRENT_LOGINS_PER_IP),
            download_rate: parse_value(source, KEY_DOWNLOAD_RATE)?,
            upload_rate: parse_value(source, KEY_UPLOAD_RATE)?,
        };

        settings.ensure_valid()?;
        Ok(settings)
    }

    fn ensure_valid(&self) -> Result<()> {
        self.validate()
            .map_err(|err| Error::ConfigError(format!("invalid settings: {err}")))?;
        Url::parse(&self.url()).map_err(|err| {
            Error::ConfigError(format!("invalid directory endpoint `{}`: {err}", self.url()))
        })?;
        Ok(())
    }

    /// Returns the directory host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the directory port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the directory endpoint URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ldap://{}:{}", self.host, self.port)
    }

    /// Returns the bind identity DN.
    #[must_use]
    pub fn bind_dn(&self) -> &str {
        &self.bind_dn
    }

    /// Returns the bind secret.
    #[must_use]
    pub fn bind_password(&self) -> &str {
        &self.bind_password
    }

    /// Returns the round-trip timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }

    /// Returns the connection pool upper bound.
    #[must_use]
    pub const fn max_active(&self) -> u32 {
        self.max_active
    }

    /// Returns the idle-connection cache size.
    #[must_use]
    pub const fn max_idle(&self) -> u32 {
        self.max_idle
    }

    /// Returns the user search/write root DN.
    #[must_use]
    pub fn user_base_dn(&self) -> &str {
        &self.user_base_dn
    }

    /// Returns the global per-user session cap.
    #[must_use]
    pub const fn max_concurrent_logins(&self) -> u32 {
        self.max_concurrent_logins
    }

    /// Returns the per-IP session cap.
    #[must_use]
    pub const fn max_concurrent_logins_per_ip(&self) -> u32 {
        self.max_concurrent_logins_per_ip
    }

    /// Returns the download rate cap in bytes per second, `None` when
    /// unbounded.
    #[must_use]
    pub const fn download_rate(&self) -> Option<u32> {
        self.download_rate
    }

    /// Returns the upload rate cap in bytes per second, `None` when
    /// unbounded.
    #[must_use]
    pub const fn upload_rate(&self) -> Option<u32> {
        self.upload_rate
    }

    /// Overrides the directory host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the directory port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the bind identity and secret.
    #[must_use]
    pub fn with_bind(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = dn.into();
        self.bind_password = password.into();
        self
    }

    /// Overrides the round-trip timeout in milliseconds.
    #[must_use]
    pub const fn with_timeout_millis(mut self, millis: u64) -> Self {
        self.timeout_millis = millis;
        self
    }

    /// Overrides the pool bounds.
    #[must_use]
    pub const fn with_pool_bounds(mut self, max_active: u32, max_idle: u32) -> Self {
        self.max_active = max_active;
        self.max_idle = max_idle;
        self
    }

    /// Overrides the user search/write root DN.
    #[must_use]
    pub fn with_user_base_dn(mut self, dn: impl Into<String>) -> Self {
        self.user_base_dn = dn.into();
        self
    }

    /// Overrides the session caps.
    #[must_use]
    pub const fn with_login_limits(mut self, global: u32, per_ip: u32) -> Self {
        self.max_concurrent_logins = global;
        self.max_concurrent_logins_per_ip = per_ip;
        self
    }

    /// Overrides the transfer rate caps; `None` means unbounded.
    #[must_use]
    pub const fn with_transfer_rates(
        mut self,
        download_rate: Option<u32>,
        upload_rate: Option<u32>,
    ) -> Self {
        self.download_rate = download_rate;
        self.upload_rate = upload_rate;
        self
    }
}

impl Default for LdapSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_CONNECTION_HOST.to_string(),
            port: DEFAULT_CONNECTION_PORT,
            bind_dn: DEFAULT_CONNECTION_NAME.to_string(),
            bind_password: DEFAULT_CONNECTION_CREDENTIALS.to_string(),
            timeout_millis: DEFAULT_CONNECTION_TIMEOUT_MILLIS,
            max_active: DEFAULT_CONNECTION_MAX_ACTIVE,
            max_idle: DEFAULT_CONNECTION_MAX_IDLE,
            user_base_dn: DEFAULT_USER_BASE_DN.to_string(),
            max_concurrent_logins: DEFAULT_MAX_CONCURRENT_LOGINS,
            max_concurrent_logins_per_ip: DEFAULT_MAX_CONCURRENT_LOGINS_PER_IP,
            download_rate: None,
            upload_rate: None,
        }
    }
}

fn parse_value<S, T>(source: &S, key: &str) -> Result<Option<T>>
where
    S: SettingsSource,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    source
        .get(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| Error::ConfigError(format!("invalid value `{value}` for `{key}`: {err}")))
        })
        .transpose()
}
