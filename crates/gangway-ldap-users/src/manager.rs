//! LDAP-backed user manager facade.

use crate::dn::DistinguishedName;
use crate::entry::{self, ATTR_PWD_LOCKOUT, ATTR_PWD_MAX_IDLE, ATTR_UID, ATTR_UNIX_FILE_PATH};
use crate::pool::{ConnectionPool, Ldap3Connector, LdapConnector, SearchScope};
use crate::settings::LdapSettings;
use async_trait::async_trait;
use gangway_core::{Authentication, Error, Result, User, UserManager};
use std::sync::Arc;
use tracing::{debug, error, warn};

const USER_ATTRIBUTES: &[&str] = &[ATTR_UID, ATTR_UNIX_FILE_PATH, ATTR_PWD_MAX_IDLE, ATTR_PWD_LOCKOUT];

/// Matches any single entry at the search base.
const SINGLE_ENTRY_FILTER: &str = "(objectClass=*)";
/// Matches user entries: `uid` present and `objectClass` contains
/// `inetOrgPerson`.
const ALL_USERS_FILTER: &str = "(&(uid=*)(objectClass=inetOrgPerson))";

/// Account store backed by an LDAP directory.
///
/// Stateless across calls apart from the shared connection pool: every
/// operation borrows one pooled session for the duration of one directory
/// round trip and releases it on every exit path. Nothing is retried; each
/// call makes exactly one attempt.
pub struct LdapUserManager {
    settings: Arc<LdapSettings>,
    pool: ConnectionPool,
    connector: Arc<dyn LdapConnector>,
}

impl LdapUserManager {
    /// Creates a user manager and its connection pool from resolved
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the connection pool cannot be
    /// built from the settings.
    pub fn new(settings: LdapSettings) -> Result<Self> {
        let settings = Arc::new(settings);
        let connector: Arc<dyn LdapConnector> = Arc::new(Ldap3Connector::new(settings.clone()));
        Self::build(settings, connector)
    }

    #[cfg(test)]
    pub(crate) fn with_connector(
        settings: LdapSettings,
        connector: Arc<dyn LdapConnector>,
    ) -> Result<Self> {
        Self::build(Arc::new(settings), connector)
    }

    fn build(settings: Arc<LdapSettings>, connector: Arc<dyn LdapConnector>) -> Result<Self> {
        let pool = ConnectionPool::new(&settings, connector.clone())?;
        Ok(Self {
            settings,
            pool,
            connector,
        })
    }

    fn user_dn(&self, name: &str) -> DistinguishedName {
        DistinguishedName::for_user(name, self.settings.user_base_dn())
    }

    async fn lookup(&self, name: &str) -> Result<Option<User>> {
        let dn = self.user_dn(name);
        let mut session = self.pool.borrow().await?;
        let entries = session
            .search(dn.as_str(), SearchScope::Base, SINGLE_ENTRY_FILTER, USER_ATTRIBUTES)
            .await?;
        drop(session);

        match entries.into_iter().next() {
            None => Ok(None),
            Some(found) => Ok(Some(entry::map_user(&found, &self.settings)?)),
        }
    }
}

#[async_trait]
impl UserManager for LdapUserManager {
    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        debug!(name, "looking up user");
        ensure_present(name, "name")?;
        self.lookup(name).await
    }

    async fn get_all_user_names(&self) -> Result<Vec<String>> {
        let mut session = self.pool.borrow().await?;
        let entries = session
            .search(
                self.settings.user_base_dn(),
                SearchScope::OneLevel,
                ALL_USERS_FILTER,
                &[ATTR_UID],
            )
            .await?;
        drop(session);

        let names = entries
            .iter()
            .map(|found| found.require(ATTR_UID).map(str::to_owned))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(?names, "listed user names");
        Ok(names)
    }

    async fn does_exist(&self, name: &str) -> Result<bool> {
        debug!(name, "checking user existence");
        ensure_present(name, "name")?;
        Ok(self.lookup(name).await?.is_some())
    }

    async fn save(&self, user: &User) -> Result<()> {
        debug!(name = %user.name, "saving user");
        ensure_present(&user.name, "user name")?;
        let password = user
            .password
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("user password is required".to_string()))?;

        let dn = self.user_dn(&user.name);
        let attributes = entry::user_attributes(user, password);
        let mut session = self.pool.borrow().await?;
        session.add(dn.as_str(), attributes).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        debug!(name, "deleting user");
        ensure_present(name, "name")?;
        let dn = self.user_dn(name);
        let mut session = self.pool.borrow().await?;
        session.delete(dn.as_str()).await
    }

    async fn authenticate(&self, authentication: &Authentication) -> Result<User> {
        let Authentication::UsernamePassword { username, password } = authentication else {
            return Err(Error::AuthenticationFailed(
                "unsupported credential kind".to_string(),
            ));
        };
        debug!(username, "authenticating user");
        ensure_present(username, "username")?;
        if password.is_empty() {
            // An empty password would turn the bind into an unauthenticated
            // one, which directories answer as anonymous success.
            return Err(Error::AuthenticationFailed("empty password".to_string()));
        }

        // Verify the credentials on a dedicated connection; pooled sessions
        // keep their admin bind.
        let dn = self.user_dn(username);
        let mut session = self.connector.connect().await?;
        let bind = session.simple_bind(dn.as_str(), password).await;
        if let Err(err) = session.unbind().await {
            warn!("failed to close verification connection: {err}");
        }
        if let Err(err) = bind {
            error!("bind verification for `{username}` failed: {err}");
            return Err(Error::AuthenticationFailed(err.to_string()));
        }

        // Re-fetch so the returned record reflects current directory state.
        match self.get_user_by_name(username).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(Error::AuthenticationFailed(format!(
                "user `{username}` no longer exists"
            ))),
            Err(err) => {
                error!("post-bind fetch for `{username}` failed: {err}");
                Err(Error::AuthenticationFailed(err.to_string()))
            }
        }
    }
}

fn ensure_present(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} is empty")));
    }
    Ok(())
}
