//! In-memory storage backend
//!
//! One `RwLock` guards each store: lookups share a read lock, every mutation
//! takes the write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AccountStore, SecretStore};
use crate::auth::Account;
use crate::error::{Result, VaultError};
use crate::secret::{SecretPayload, SecretRecord};

type RecordKey = (String, String);

/// In-memory secret store for a single category
pub struct MemoryStore<P> {
    records: RwLock<HashMap<RecordKey, P>>,
}

impl<P: SecretPayload> MemoryStore<P> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<P: SecretPayload> Default for MemoryStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn key(owner: &str, meta_key: &str) -> RecordKey {
    (owner.to_string(), meta_key.to_string())
}

#[async_trait]
impl<P: SecretPayload> SecretStore<P> for MemoryStore<P> {
    async fn insert(&self, owner: &str, record: &SecretRecord<P>) -> Result<()> {
        let mut records = self.records.write().await;
        let key = key(owner, &record.meta_key);

        if records.contains_key(&key) {
            return Err(VaultError::AlreadyExists(record.meta_key.clone()));
        }
        records.insert(key, record.payload.clone());

        debug!("Stored {} record: {}", P::CATEGORY, record.meta_key);
        Ok(())
    }

    async fn fetch(&self, owner: &str, meta_key: &str) -> Result<SecretRecord<P>> {
        let records = self.records.read().await;

        records
            .get(&key(owner, meta_key))
            .map(|payload| SecretRecord::new(meta_key, payload.clone()))
            .ok_or_else(|| VaultError::NotFound(meta_key.to_string()))
    }

    async fn remove(&self, owner: &str, meta_key: &str) -> Result<()> {
        let mut records = self.records.write().await;

        records
            .remove(&key(owner, meta_key))
            .map(|_| ())
            .ok_or_else(|| VaultError::NotFound(meta_key.to_string()))
    }

    async fn replace(&self, owner: &str, record: &SecretRecord<P>) -> Result<()> {
        let mut records = self.records.write().await;

        match records.get_mut(&key(owner, &record.meta_key)) {
            Some(payload) => {
                *payload = record.payload.clone();
                Ok(())
            }
            None => Err(VaultError::NotFound(record.meta_key.clone())),
        }
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Storage"
    }
}

/// In-memory account store
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account.email) {
            return Err(VaultError::AlreadyExists(account.email.clone()));
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn find(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn update_password_hash(&self, email: &str, password_hash: &str) -> Result<()> {
        let mut accounts = self.accounts.write().await;

        let account = accounts
            .get_mut(email)
            .ok_or_else(|| VaultError::NotFound(email.to_string()))?;
        account.password_hash = password_hash.to_string();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Storage"
    }
}
