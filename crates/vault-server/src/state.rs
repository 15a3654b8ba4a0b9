//! Shared handler state and storage wiring

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use vault_core::{
    AccountService, BinaryPayload, CardPayload, CredentialAuthority, CredentialPayload,
    MemoryAccountStore, MemoryStore, Result, SecretPayload, SecretVault, SqliteStore,
    StorageBackend, TextPayload,
};

/// State shared by every handler and by the access gate
pub struct AppState {
    pub accounts: AccountService,
    pub credentials: SecretVault<CredentialPayload>,
    pub cards: SecretVault<CardPayload>,
    pub texts: SecretVault<TextPayload>,
    pub binaries: SecretVault<BinaryPayload>,
}

impl AppState {
    /// State backed by process-local maps
    pub fn in_memory(authority: Arc<CredentialAuthority>) -> Self {
        Self {
            accounts: AccountService::new(Arc::new(MemoryAccountStore::new()), authority),
            credentials: SecretVault::new(Arc::new(MemoryStore::new())),
            cards: SecretVault::new(Arc::new(MemoryStore::new())),
            texts: SecretVault::new(Arc::new(MemoryStore::new())),
            binaries: SecretVault::new(Arc::new(MemoryStore::new())),
        }
    }

    /// State backed by one SQLite database shared by all categories
    pub fn with_sqlite(store: SqliteStore, authority: Arc<CredentialAuthority>) -> Self {
        let store = Arc::new(store);
        Self {
            accounts: AccountService::new(store.clone(), authority),
            credentials: SecretVault::new(store.clone()),
            cards: SecretVault::new(store.clone()),
            texts: SecretVault::new(store.clone()),
            binaries: SecretVault::new(store),
        }
    }

    /// Build state for the configured backend
    pub async fn open(
        backend: StorageBackend,
        database_path: &Path,
        authority: Arc<CredentialAuthority>,
    ) -> Result<Self> {
        match backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage; records are lost on restart");
                Ok(Self::in_memory(authority))
            }
            StorageBackend::Sqlite => {
                info!("Using SQLite storage at {:?}", database_path);
                let store = SqliteStore::open(database_path).await?;
                Ok(Self::with_sqlite(store, authority))
            }
        }
    }

    pub fn authority(&self) -> &Arc<CredentialAuthority> {
        self.accounts.authority()
    }
}

/// Selects the vault serving payload type `P`
pub trait VaultFor<P: SecretPayload> {
    fn vault(&self) -> &SecretVault<P>;
}

impl VaultFor<CredentialPayload> for AppState {
    fn vault(&self) -> &SecretVault<CredentialPayload> {
        &self.credentials
    }
}

impl VaultFor<CardPayload> for AppState {
    fn vault(&self) -> &SecretVault<CardPayload> {
        &self.cards
    }
}

impl VaultFor<TextPayload> for AppState {
    fn vault(&self) -> &SecretVault<TextPayload> {
        &self.texts
    }
}

impl VaultFor<BinaryPayload> for AppState {
    fn vault(&self) -> &SecretVault<BinaryPayload> {
        &self.binaries
    }
}
