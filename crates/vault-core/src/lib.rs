//! # vault-core
//!
//! Core functionality for the multi-category secret vault including:
//! - Chunked RSA-OAEP (SHA-256) codec and key-pair tooling
//! - Salted password hashing and HMAC-signed session tokens
//! - Structural validation for cards, credentials, text and binary secrets
//! - A generic keyed CRUD engine over in-memory and SQLite storage

pub mod auth;
pub mod crypto;
pub mod error;
pub mod secret;
pub mod settings;
pub mod storage;
mod vault;

pub use auth::{Account, AccountService, CredentialAuthority, PasswordScheme, TokenSigner};
pub use crypto::{decrypt, encrypt, CipherCodec, RsaPrivateKey, RsaPublicKey, TokenSecret};
pub use error::{ErrorBody, ErrorKind, Result, TokenError, ValidationError, VaultError};
pub use secret::{
    BinaryPayload, Blob, CardDetails, CardPayload, Category, Ciphertext, CredentialPayload,
    LoginPair, Note, Sealable, SecretPayload, SecretRecord, TextPayload,
};
pub use settings::{SettingsManager, StorageBackend, VaultSettings};
pub use storage::{AccountStore, MemoryAccountStore, MemoryStore, SecretStore, SqliteStore};
pub use vault::SecretVault;
