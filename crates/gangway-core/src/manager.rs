//! The account store capability required by the hosting service.

use crate::auth::Authentication;
use crate::user::User;

/// Account store abstraction trait.
///
/// The hosting file-transfer service depends only on this interface, never
/// on a concrete backend. Implementations are stateless across calls apart
/// from whatever connection resources they manage internally, and they are
/// safe for concurrent use from multiple tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserManager: Send + Sync {
    /// Fetches the account with the given name.
    ///
    /// Returns `Ok(None)` when no such account exists; absence is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// `name` is empty, or [`Error::OperationFailed`](crate::Error::OperationFailed)
    /// on a store fault.
    async fn get_user_by_name(&self, name: &str) -> crate::Result<Option<User>>;

    /// Lists every account name, in the order the store returns them.
    ///
    /// # Errors
    ///
    /// Returns an error on a store fault.
    async fn get_all_user_names(&self) -> crate::Result<Vec<String>>;

    /// Returns true if an account with the given name exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// `name` is empty, or an error on a store fault.
    async fn does_exist(&self, name: &str) -> crate::Result<bool>;

    /// Creates the account as a new entry in the store.
    ///
    /// This is an add, not an upsert: saving a name that already exists is a
    /// reported failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// the record lacks a name or password, or an error on a store fault.
    async fn save(&self, user: &User) -> crate::Result<()>;

    /// Removes the account with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// `name` is empty, or an error on a store fault (including deleting a
    /// name that does not exist).
    async fn delete(&self, name: &str) -> crate::Result<()>;

    /// Verifies the supplied credentials and returns the current account
    /// record on success.
    ///
    /// The returned record reflects store state at the time of the call, not
    /// any value captured before verification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`](crate::Error::AuthenticationFailed)
    /// for a rejected password, an unsupported credential kind, or a failed
    /// post-verification fetch.
    async fn authenticate(&self, authentication: &Authentication) -> crate::Result<User>;
}
