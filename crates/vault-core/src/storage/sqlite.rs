//! SQLite storage backend
//!
//! All statements run on tokio-rusqlite's single connection thread, so SQLite
//! itself serializes writers and no in-process lock is needed. Key conflicts
//! are detected by the engine: a primary-key constraint violation becomes
//! `AlreadyExists` and an update or delete touching zero rows becomes
//! `NotFound`.
//!
//! Payloads are stored as JSON text (ciphertext fields are base64 inside).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension};
use tokio_rusqlite::Connection;
use tracing::{debug, error, info};

use super::{AccountStore, SecretStore};
use crate::auth::Account;
use crate::error::{Result, VaultError};
use crate::secret::{SecretPayload, SecretRecord};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        email TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS secrets (
        owner TEXT NOT NULL,
        category TEXT NOT NULL,
        meta_key TEXT NOT NULL,
        payload TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (owner, category, meta_key)
    );
";

/// Helper to convert tokio_rusqlite errors into a logged storage error
fn storage_err(e: tokio_rusqlite::Error) -> VaultError {
    error!("SQLite operation failed: {}", e);
    VaultError::StorageError(e.to_string())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

/// SQLite-backed store for accounts and every secret category
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and bootstrap the schema
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| VaultError::StorageError(format!("failed to open {:?}: {}", path, e)))?;
        let store = Self::with_connection(conn).await?;

        info!("SQLite storage opened at {:?}", path);
        Ok(store)
    }

    /// Open a private in-memory database (for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(storage_err)?;

        debug!("SQLite schema ready");
        Ok(Self {
            conn: Arc::new(conn),
        })
    }
}

#[async_trait]
impl<P: SecretPayload> SecretStore<P> for SqliteStore {
    async fn insert(&self, owner: &str, record: &SecretRecord<P>) -> Result<()> {
        let owner = owner.to_string();
        let meta_key = record.meta_key.clone();
        let payload = serde_json::to_string(&record.payload)?;
        let now = Utc::now().to_rfc3339();

        let inserted = self
            .conn
            .call(move |conn| {
                match conn.execute(
                    "INSERT INTO secrets (owner, category, meta_key, payload, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    rusqlite::params![owner, P::CATEGORY.as_str(), meta_key, payload, now],
                ) {
                    Ok(_) => Ok(true),
                    Err(e) if is_constraint_violation(&e) => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(storage_err)?;

        if !inserted {
            return Err(VaultError::AlreadyExists(record.meta_key.clone()));
        }

        debug!("Stored {} record: {}", P::CATEGORY, record.meta_key);
        Ok(())
    }

    async fn fetch(&self, owner: &str, meta_key: &str) -> Result<SecretRecord<P>> {
        let owner = owner.to_string();
        let key = meta_key.to_string();

        let payload: Option<String> = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT payload FROM secrets WHERE owner = ?1 AND category = ?2 AND meta_key = ?3",
                    rusqlite::params![owner, P::CATEGORY.as_str(), key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(storage_err)?;

        let payload = payload.ok_or_else(|| VaultError::NotFound(meta_key.to_string()))?;
        let payload: P = serde_json::from_str(&payload).map_err(|e| {
            error!("Corrupt {} payload for {}: {}", P::CATEGORY, meta_key, e);
            VaultError::StorageError(e.to_string())
        })?;

        Ok(SecretRecord::new(meta_key, payload))
    }

    async fn remove(&self, owner: &str, meta_key: &str) -> Result<()> {
        let owner = owner.to_string();
        let key = meta_key.to_string();

        let affected = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM secrets WHERE owner = ?1 AND category = ?2 AND meta_key = ?3",
                    rusqlite::params![owner, P::CATEGORY.as_str(), key],
                )
            })
            .await
            .map_err(storage_err)?;

        if affected == 0 {
            return Err(VaultError::NotFound(meta_key.to_string()));
        }
        Ok(())
    }

    async fn replace(&self, owner: &str, record: &SecretRecord<P>) -> Result<()> {
        let owner = owner.to_string();
        let meta_key = record.meta_key.clone();
        let payload = serde_json::to_string(&record.payload)?;
        let now = Utc::now().to_rfc3339();

        let affected = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE secrets SET payload = ?4, updated_at = ?5 \
                     WHERE owner = ?1 AND category = ?2 AND meta_key = ?3",
                    rusqlite::params![owner, P::CATEGORY.as_str(), meta_key, payload, now],
                )
            })
            .await
            .map_err(storage_err)?;

        if affected == 0 {
            return Err(VaultError::NotFound(record.meta_key.clone()));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "SQLite Storage"
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn insert(&self, account: &Account) -> Result<()> {
        let email = account.email.clone();
        let password_hash = account.password_hash.clone();
        let created_at = account.created_at.to_rfc3339();

        let inserted = self
            .conn
            .call(move |conn| {
                match conn.execute(
                    "INSERT INTO accounts (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![email, password_hash, created_at],
                ) {
                    Ok(_) => Ok(true),
                    Err(e) if is_constraint_violation(&e) => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(storage_err)?;

        if !inserted {
            return Err(VaultError::AlreadyExists(account.email.clone()));
        }
        Ok(())
    }

    async fn find(&self, email: &str) -> Result<Option<Account>> {
        let key = email.to_string();

        let row: Option<(String, String, String)> = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT email, password_hash, created_at FROM accounts WHERE email = ?1",
                    rusqlite::params![key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
            })
            .await
            .map_err(storage_err)?;

        row.map(|(email, password_hash, created_at)| {
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| VaultError::StorageError(format!("bad created_at: {}", e)))?
                .with_timezone(&Utc);
            Ok(Account {
                email,
                password_hash,
                created_at,
            })
        })
        .transpose()
    }

    async fn update_password_hash(&self, email: &str, password_hash: &str) -> Result<()> {
        let key = email.to_string();
        let password_hash = password_hash.to_string();

        let affected = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE accounts SET password_hash = ?2 WHERE email = ?1",
                    rusqlite::params![key, password_hash],
                )
            })
            .await
            .map_err(storage_err)?;

        if affected == 0 {
            return Err(VaultError::NotFound(email.to_string()));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "SQLite Storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::{CardPayload, Ciphertext, TextPayload};
    use tempfile::TempDir;

    fn text(body: &str) -> TextPayload {
        TextPayload {
            body: Ciphertext::from(body.as_bytes()),
        }
    }

    fn card() -> CardPayload {
        CardPayload {
            number: vec![1; 8].into(),
            period: vec![2; 8].into(),
            cvv: vec![3; 8].into(),
            full_name: vec![4; 8].into(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let record = SecretRecord::new("visa", card());

        SecretStore::insert(&store, "a@b.com", &record).await.unwrap();
        let fetched: SecretRecord<CardPayload> = store.fetch("a@b.com", "visa").await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_duplicate_key_maps_to_already_exists() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        SecretStore::insert(
            &store, "a@b.com", &SecretRecord::new("note", text("first")))
            .await
            .unwrap();

        let result = SecretStore::insert(
            &store, "a@b.com", &SecretRecord::new("note", text("second")))
            .await;
        assert!(matches!(result, Err(VaultError::AlreadyExists(_))));

        let stored: SecretRecord<TextPayload> = store.fetch("a@b.com", "note").await.unwrap();
        assert_eq!(stored.payload, text("first"));
    }

    #[tokio::test]
    async fn test_categories_do_not_collide() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        SecretStore::insert(
            &store, "a@b.com", &SecretRecord::new("same", text("note")))
            .await
            .unwrap();
        SecretStore::insert(
            &store, "a@b.com", &SecretRecord::new("same", card()))
            .await
            .unwrap();

        let result: Result<SecretRecord<TextPayload>> = store.fetch("a@b.com", "same").await;
        assert_eq!(result.unwrap().payload, text("note"));
    }

    #[tokio::test]
    async fn test_zero_rows_maps_to_not_found() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        let fetched: Result<SecretRecord<TextPayload>> = store.fetch("a@b.com", "missing").await;
        assert!(matches!(fetched, Err(VaultError::NotFound(_))));

        let removed = SecretStore::<TextPayload>::remove(&store, "a@b.com", "missing").await;
        assert!(matches!(removed, Err(VaultError::NotFound(_))));

        let replaced = SecretStore::replace(
            &store, "a@b.com", &SecretRecord::new("missing", text("x")))
            .await;
        assert!(matches!(replaced, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_and_remove() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        SecretStore::insert(
            &store, "a@b.com", &SecretRecord::new("note", text("old")))
            .await
            .unwrap();
        SecretStore::replace(
            &store, "a@b.com", &SecretRecord::new("note", text("new")))
            .await
            .unwrap();

        let fetched: SecretRecord<TextPayload> = store.fetch("a@b.com", "note").await.unwrap();
        assert_eq!(fetched.payload, text("new"));

        SecretStore::<TextPayload>::remove(&store, "a@b.com", "note")
            .await
            .unwrap();
        let gone: Result<SecretRecord<TextPayload>> = store.fetch("a@b.com", "note").await;
        assert!(gone.is_err());
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("vault.db");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            SecretStore::insert(
                &store, "a@b.com", &SecretRecord::new("note", text("kept")))
                .await
                .unwrap();
            AccountStore::insert(&store, &Account::new("a@b.com", "hash"))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).await.unwrap();
        let fetched: SecretRecord<TextPayload> = store.fetch("a@b.com", "note").await.unwrap();
        assert_eq!(fetched.payload, text("kept"));
        assert!(store.find("a@b.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_account_store() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let account = Account::new("a@b.com", "hash1");

        AccountStore::insert(&store, &account).await.unwrap();
        assert!(matches!(
            AccountStore::insert(&store, &account).await,
            Err(VaultError::AlreadyExists(_))
        ));

        store.update_password_hash("a@b.com", "hash2").await.unwrap();
        let found = store.find("a@b.com").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash2");
        assert_eq!(found.created_at.timestamp(), account.created_at.timestamp());

        assert!(matches!(
            store.update_password_hash("x@y.com", "h").await,
            Err(VaultError::NotFound(_))
        ));
    }
}
