//! Keyed CRUD engine shared by every secret category

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{Result, VaultError};
use crate::secret::validate::validate_meta_key;
use crate::secret::{SecretPayload, SecretRecord};
use crate::storage::SecretStore;

/// Vault for one payload type `P`
///
/// Every mutating call validates the meta key and the payload before the
/// store is touched. Backend faults are logged here and reported as
/// [`VaultError::Internal`]; key conflicts pass through unchanged.
pub struct SecretVault<P: SecretPayload> {
    store: Arc<dyn SecretStore<P>>,
}

impl<P: SecretPayload> Clone for SecretVault<P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<P: SecretPayload> SecretVault<P> {
    /// Create a vault over the given store
    pub fn new(store: Arc<dyn SecretStore<P>>) -> Self {
        Self { store }
    }

    /// Name of the backing store
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Store a new record; `AlreadyExists` if the key is taken
    pub async fn create(&self, owner: &str, record: &SecretRecord<P>) -> Result<()> {
        validate_meta_key(&record.meta_key)?;
        record.payload.check()?;

        self.store
            .insert(owner, record)
            .await
            .map_err(|e| self.internal(e))?;
        debug!("Created {} record: {}", P::CATEGORY, record.meta_key);
        Ok(())
    }

    /// Fetch a record; `NotFound` if absent
    pub async fn get(&self, owner: &str, meta_key: &str) -> Result<SecretRecord<P>> {
        validate_meta_key(meta_key)?;
        self.store
            .fetch(owner, meta_key)
            .await
            .map_err(|e| self.internal(e))
    }

    /// Remove a record; `NotFound` if absent
    pub async fn delete(&self, owner: &str, meta_key: &str) -> Result<()> {
        validate_meta_key(meta_key)?;
        self.store
            .remove(owner, meta_key)
            .await
            .map_err(|e| self.internal(e))?;
        debug!("Deleted {} record: {}", P::CATEGORY, meta_key);
        Ok(())
    }

    /// Replace the payload of an existing record; `NotFound` if absent
    pub async fn change(&self, owner: &str, record: &SecretRecord<P>) -> Result<()> {
        validate_meta_key(&record.meta_key)?;
        record.payload.check()?;

        self.store
            .replace(owner, record)
            .await
            .map_err(|e| self.internal(e))?;
        debug!("Changed {} record: {}", P::CATEGORY, record.meta_key);
        Ok(())
    }

    fn internal(&self, e: VaultError) -> VaultError {
        match e {
            VaultError::NotFound(_) | VaultError::AlreadyExists(_) => e,
            other => {
                error!(
                    "{} backend failure on {} records: {}",
                    self.store.backend_name(),
                    P::CATEGORY,
                    other
                );
                VaultError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::secret::{CardPayload, Ciphertext, CredentialPayload, TextPayload};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts calls and always fails
    #[derive(Default)]
    struct BrokenStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl<P: SecretPayload> SecretStore<P> for BrokenStore {
        async fn insert(&self, _owner: &str, _record: &SecretRecord<P>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VaultError::StorageError("disk on fire".into()))
        }

        async fn fetch(&self, _owner: &str, _meta_key: &str) -> Result<SecretRecord<P>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VaultError::StorageError("disk on fire".into()))
        }

        async fn remove(&self, _owner: &str, _meta_key: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VaultError::StorageError("disk on fire".into()))
        }

        async fn replace(&self, _owner: &str, _record: &SecretRecord<P>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VaultError::StorageError("disk on fire".into()))
        }

        fn backend_name(&self) -> &'static str {
            "Broken"
        }
    }

    fn text(body: &[u8]) -> SecretRecord<TextPayload> {
        SecretRecord::new(
            "note",
            TextPayload {
                body: Ciphertext::from(body),
            },
        )
    }

    fn credential(login: &[u8], password: &[u8]) -> SecretRecord<CredentialPayload> {
        SecretRecord::new(
            "mail",
            CredentialPayload {
                login: Ciphertext::from(login),
                password: Ciphertext::from(password),
            },
        )
    }

    #[tokio::test]
    async fn test_crud_lifecycle() {
        let vault: SecretVault<TextPayload> = SecretVault::new(Arc::new(MemoryStore::new()));

        vault.create("a@b.com", &text(b"one")).await.unwrap();
        assert!(matches!(
            vault.create("a@b.com", &text(b"two")).await,
            Err(VaultError::AlreadyExists(_))
        ));

        let fetched = vault.get("a@b.com", "note").await.unwrap();
        assert_eq!(fetched.payload.body.as_bytes(), b"one");

        vault.change("a@b.com", &text(b"two")).await.unwrap();
        let fetched = vault.get("a@b.com", "note").await.unwrap();
        assert_eq!(fetched.payload.body.as_bytes(), b"two");

        vault.delete("a@b.com", "note").await.unwrap();
        assert!(matches!(
            vault.get("a@b.com", "note").await,
            Err(VaultError::NotFound(_))
        ));
        assert!(matches!(
            vault.delete("a@b.com", "note").await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_change_missing_is_not_found() {
        let vault: SecretVault<TextPayload> = SecretVault::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            vault.change("a@b.com", &text(b"x")).await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let vault: SecretVault<TextPayload> = SecretVault::new(Arc::new(MemoryStore::new()));
        vault.create("a@b.com", &text(b"mine")).await.unwrap();

        assert!(matches!(
            vault.get("x@y.com", "note").await,
            Err(VaultError::NotFound(_))
        ));
        vault.create("x@y.com", &text(b"theirs")).await.unwrap();
        assert_eq!(
            vault.get("a@b.com", "note").await.unwrap().payload.body.as_bytes(),
            b"mine"
        );
    }

    #[tokio::test]
    async fn test_validation_runs_before_storage() {
        let store = Arc::new(BrokenStore::default());
        let vault: SecretVault<CredentialPayload> = SecretVault::new(store.clone());

        let result = vault.create("a@b.com", &credential(b"", b"secret")).await;
        assert!(matches!(
            result,
            Err(VaultError::InvalidArgument(ValidationError::EmptyField("login")))
        ));

        let result = vault.change("a@b.com", &credential(b"user", b"")).await;
        assert!(matches!(
            result,
            Err(VaultError::InvalidArgument(ValidationError::EmptyField("password")))
        ));

        let result = vault.get("a@b.com", "  ").await;
        assert!(matches!(
            result,
            Err(VaultError::InvalidArgument(ValidationError::EmptyMetaKey))
        ));

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_card_fields_checked_before_storage() {
        let store = Arc::new(BrokenStore::default());
        let vault: SecretVault<CardPayload> = SecretVault::new(store.clone());
        let record = SecretRecord::new(
            "visa",
            CardPayload {
                number: Ciphertext::from(&b"n"[..]),
                period: Ciphertext::from(&b"p"[..]),
                cvv: Ciphertext::from(Vec::new()),
                full_name: Ciphertext::from(&b"f"[..]),
            },
        );

        assert!(matches!(
            vault.create("a@b.com", &record).await,
            Err(VaultError::InvalidArgument(ValidationError::InvalidCvv))
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_internal() {
        let store = Arc::new(BrokenStore::default());
        let vault: SecretVault<TextPayload> = SecretVault::new(store.clone());

        assert!(matches!(
            vault.create("a@b.com", &text(b"x")).await,
            Err(VaultError::Internal)
        ));
        assert!(matches!(
            vault.get("a@b.com", "note").await,
            Err(VaultError::Internal)
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
