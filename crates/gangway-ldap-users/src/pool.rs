//! Directory session seams and the managed connection pool.
//!
//! The pool is built once, at facade construction. Checked-out sessions are
//! validated first and discarded on failure, creation performs the admin
//! bind, and release is tied to the guard returned by [`ConnectionPool::borrow`],
//! so a borrowed session goes back to the pool on every exit path.

use crate::entry::DirectoryEntry;
use crate::settings::LdapSettings;
use async_trait::async_trait;
use deadpool::managed;
use deadpool::Runtime;
use gangway_core::{Error, Result};
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Directory result code for `noSuchObject`.
const NO_SUCH_OBJECT: u32 = 32;

/// Represents the search scope for directory queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapSession: Send {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<DirectoryEntry>>;
    async fn add(&mut self, dn: &str, attributes: Vec<(String, Vec<String>)>) -> Result<()>;
    async fn delete(&mut self, dn: &str) -> Result<()>;
    async fn validate(&mut self) -> Result<()>;
    async fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Real connector backed by `ldap3`.
pub(crate) struct Ldap3Connector {
    settings: Arc<LdapSettings>,
}

impl Ldap3Connector {
    pub(crate) fn new(settings: Arc<LdapSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl LdapConnector for Ldap3Connector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let conn_settings = LdapConnSettings::new().set_conn_timeout(self.settings.timeout());
        let (conn, ldap) = LdapConnAsync::with_settings(conn_settings, &self.settings.url())
            .await
            .map_err(map_ldap_error)?;
        ldap3::drive!(conn);
        Ok(Box::new(Ldap3Session {
            inner: ldap,
            operation_timeout: self.settings.timeout(),
        }))
    }
}

struct Ldap3Session {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl LdapSession for Ldap3Session {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let result = timeout(self.operation_timeout, self.inner.simple_bind(dn, password))
            .await
            .map_err(|_| Error::Timeout("directory bind timed out".to_string()))?
            .map_err(map_ldap_error)?;
        result.success().map_err(map_ldap_error)?;
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<DirectoryEntry>> {
        let result = timeout(
            self.operation_timeout,
            self.inner
                .search(base_dn, scope.into(), filter, attributes.to_vec()),
        )
        .await
        .map_err(|_| Error::Timeout("directory search timed out".to_string()))?
        .map_err(map_ldap_error)?;

        match result.success() {
            Ok((entries, _)) => Ok(entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(|entry| DirectoryEntry {
                    dn: entry.dn,
                    attributes: entry.attrs,
                })
                .collect()),
            // An absent base object is "no entries", not a fault.
            Err(ldap3::LdapError::LdapResult { result }) if result.rc == NO_SUCH_OBJECT => {
                Ok(Vec::new())
            }
            Err(err) => Err(map_ldap_error(err)),
        }
    }

    async fn add(&mut self, dn: &str, attributes: Vec<(String, Vec<String>)>) -> Result<()> {
        let attrs: Vec<(String, HashSet<String>)> = attributes
            .into_iter()
            .map(|(attribute, values)| (attribute, values.into_iter().collect()))
            .collect();
        let result = timeout(self.operation_timeout, self.inner.add(dn, attrs))
            .await
            .map_err(|_| Error::Timeout("directory add timed out".to_string()))?
            .map_err(map_ldap_error)?;
        result.success().map_err(map_ldap_error)?;
        Ok(())
    }

    async fn delete(&mut self, dn: &str) -> Result<()> {
        let result = timeout(self.operation_timeout, self.inner.delete(dn))
            .await
            .map_err(|_| Error::Timeout("directory delete timed out".to_string()))?
            .map_err(map_ldap_error)?;
        result.success().map_err(map_ldap_error)?;
        Ok(())
    }

    async fn validate(&mut self) -> Result<()> {
        // A root DSE read is the cheapest liveness probe every server answers.
        self.search("", SearchScope::Base, "(objectClass=*)", &["1.1"])
            .await
            .map(|_| ())
    }

    async fn unbind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.unbind())
            .await
            .map_err(|_| Error::Timeout("directory unbind timed out".to_string()))?
            .map_err(map_ldap_error)?;
        Ok(())
    }
}

fn map_ldap_error(err: ldap3::LdapError) -> Error {
    Error::OperationFailed(format!("directory error: {err}"))
}

pub(crate) struct SessionManager {
    connector: Arc<dyn LdapConnector>,
    bind_dn: String,
    bind_password: String,
}

#[async_trait]
impl managed::Manager for SessionManager {
    type Type = Box<dyn LdapSession>;
    type Error = Error;

    async fn create(&self) -> Result<Box<dyn LdapSession>> {
        debug!("opening pooled directory connection");
        let mut session = self.connector.connect().await?;
        session
            .simple_bind(&self.bind_dn, &self.bind_password)
            .await?;
        Ok(session)
    }

    async fn recycle(&self, session: &mut Box<dyn LdapSession>) -> managed::RecycleResult<Error> {
        session.validate().await.map_err(|err| {
            warn!("discarding directory connection that failed validation: {err}");
            managed::RecycleError::Backend(err)
        })
    }
}

/// A borrowed directory session; returns to the pool when dropped.
pub(crate) type PooledSession = managed::Object<SessionManager>;

/// Bounded pool of live, admin-bound directory sessions.
pub(crate) struct ConnectionPool {
    pool: managed::Pool<SessionManager>,
}

impl ConnectionPool {
    pub(crate) fn new(settings: &LdapSettings, connector: Arc<dyn LdapConnector>) -> Result<Self> {
        debug!(
            max_active = settings.max_active(),
            max_idle = settings.max_idle(),
            "building directory connection pool"
        );
        let manager = SessionManager {
            connector,
            bind_dn: settings.bind_dn().to_string(),
            bind_password: settings.bind_password().to_string(),
        };
        let pool = managed::Pool::builder(manager)
            .max_size(settings.max_active() as usize)
            .wait_timeout(Some(settings.timeout()))
            .create_timeout(Some(settings.timeout()))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|err| Error::ConfigError(format!("failed to build connection pool: {err}")))?;
        Ok(Self { pool })
    }

    /// Borrows a live, validated session or fails per pool policy.
    pub(crate) async fn borrow(&self) -> Result<PooledSession> {
        self.pool.get().await.map_err(|err| match err {
            managed::PoolError::Backend(err) => err,
            managed::PoolError::Timeout(_) => {
                Error::Timeout("timed out waiting for a directory connection".to_string())
            }
            other => Error::OperationFailed(format!("connection pool failure: {other}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_settings() -> LdapSettings {
        LdapSettings::default().with_pool_bounds(1, 1)
    }

    fn bound_session() -> MockLdapSession {
        let mut session = MockLdapSession::new();
        session
            .expect_simple_bind()
            .with(
                mockall::predicate::eq("uid=admin,ou=system"),
                mockall::predicate::eq("secret"),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        session
    }

    #[tokio::test]
    async fn checkout_creates_admin_bound_session_and_reuses_it() {
        let mut session = bound_session();
        session.expect_validate().times(1).returning(|| Ok(()));

        let mut connector = MockLdapConnector::new();
        connector
            .expect_connect()
            .times(1)
            .return_once(move || Ok(Box::new(session)));

        let pool = ConnectionPool::new(&pool_settings(), Arc::new(connector)).unwrap();

        // First borrow creates; second revalidates the cached session.
        drop(pool.borrow().await.unwrap());
        drop(pool.borrow().await.unwrap());
    }

    #[tokio::test]
    async fn failed_validation_discards_and_replaces_the_session() {
        let mut stale = bound_session();
        stale
            .expect_validate()
            .times(1)
            .returning(|| Err(Error::OperationFailed("connection reset".to_string())));
        let fresh = bound_session();

        let mut connector = MockLdapConnector::new();
        let mut sequence = mockall::Sequence::new();
        connector
            .expect_connect()
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(move || Ok(Box::new(stale)));
        connector
            .expect_connect()
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(move || Ok(Box::new(fresh)));

        let pool = ConnectionPool::new(&pool_settings(), Arc::new(connector)).unwrap();

        drop(pool.borrow().await.unwrap());
        // The stale session fails checkout validation and a fresh one is
        // created in its place.
        drop(pool.borrow().await.unwrap());
    }

    #[tokio::test]
    async fn failed_admin_bind_surfaces_as_borrow_error() {
        let mut session = MockLdapSession::new();
        session
            .expect_simple_bind()
            .times(1)
            .returning(|_, _| Err(Error::OperationFailed("invalid credentials".to_string())));

        let mut connector = MockLdapConnector::new();
        connector
            .expect_connect()
            .times(1)
            .return_once(move || Ok(Box::new(session)));

        let pool = ConnectionPool::new(&pool_settings(), Arc::new(connector)).unwrap();

        let err = match pool.borrow().await {
            Ok(_) => panic!("expected borrow to fail"),
            Err(err) => err,
        };
        assert!(matches!(err, Error::OperationFailed(_)));
    }
}
