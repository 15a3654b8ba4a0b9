//! Storage trait definitions

use async_trait::async_trait;

use crate::auth::Account;
use crate::error::Result;
use crate::secret::{SecretPayload, SecretRecord};

/// Keyed storage for one secret category
///
/// Records are addressed by `(owner, meta_key)`. Implementations report
/// `AlreadyExists` / `NotFound` for key conflicts and `StorageError` for
/// anything the backend itself failed at.
#[async_trait]
pub trait SecretStore<P: SecretPayload>: Send + Sync {
    /// Insert a new record; `AlreadyExists` if the key is taken
    async fn insert(&self, owner: &str, record: &SecretRecord<P>) -> Result<()>;

    /// Fetch a record; `NotFound` if absent
    async fn fetch(&self, owner: &str, meta_key: &str) -> Result<SecretRecord<P>>;

    /// Remove a record; `NotFound` if absent
    async fn remove(&self, owner: &str, meta_key: &str) -> Result<()>;

    /// Replace the payload of an existing record; `NotFound` if absent
    async fn replace(&self, owner: &str, record: &SecretRecord<P>) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}

/// Storage for registered accounts
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account; `AlreadyExists` if the email is taken
    async fn insert(&self, account: &Account) -> Result<()>;

    /// Look up an account by email
    async fn find(&self, email: &str) -> Result<Option<Account>>;

    /// Overwrite the stored password hash; `NotFound` if absent
    async fn update_password_hash(&self, email: &str, password_hash: &str) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
