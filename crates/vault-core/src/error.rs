//! Error types for vault-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// Argument rejected by the remote side
    #[error("Invalid argument: {0}")]
    InvalidRequest(String),

    #[error("Invalid email or password")]
    Unauthenticated,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Internal error")]
    Internal,

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Key error: {0}")]
    KeyError(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VaultError {
    /// Collapse the error onto the caller-visible taxonomy.
    ///
    /// Backend, crypto and IO faults all become [`ErrorKind::Internal`] so that no
    /// backend detail leaks past the server boundary. Token failures of any
    /// flavour become [`ErrorKind::PermissionDenied`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VaultError::InvalidArgument(_) | VaultError::InvalidRequest(_) => {
                ErrorKind::InvalidArgument
            }
            VaultError::Unauthenticated => ErrorKind::Unauthenticated,
            VaultError::PermissionDenied | VaultError::Token(_) => ErrorKind::PermissionDenied,
            VaultError::DecryptionError(_) => ErrorKind::Decryption,
            _ => ErrorKind::Internal,
        }
    }
}

/// Caller-visible error classes, shared by the server and the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    Internal,
    /// Codec failure; only ever raised on the client side
    Decryption,
}

/// JSON body returned with every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    /// Build the body for an error; internal faults carry no detail
    pub fn from_error(err: &VaultError) -> Self {
        let code = err.kind();
        let message = match code {
            ErrorKind::Internal | ErrorKind::Decryption => "internal error".to_string(),
            ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => err.to_string(),
        };
        Self { code, message }
    }

    /// Rebuild the error on the receiving side
    pub fn into_error(self) -> VaultError {
        match self.code {
            ErrorKind::NotFound => VaultError::NotFound(self.message),
            ErrorKind::AlreadyExists => VaultError::AlreadyExists(self.message),
            ErrorKind::InvalidArgument => VaultError::InvalidRequest(self.message),
            ErrorKind::Unauthenticated => VaultError::Unauthenticated,
            ErrorKind::PermissionDenied => VaultError::PermissionDenied,
            ErrorKind::Internal | ErrorKind::Decryption => VaultError::Internal,
        }
    }
}

/// Structural validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("card number must be 16 digits and pass the Luhn checksum")]
    InvalidNumber,

    #[error("card period must use the MM.YYYY layout")]
    InvalidPeriod,

    #[error("card CVV must be exactly 3 digits")]
    InvalidCvv,

    #[error("card holder name must be at least 4 characters")]
    InvalidFullName,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("payload must not be empty")]
    EmptyPayload,

    #[error("malformed email address")]
    InvalidEmail,

    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("meta key must not be empty")]
    EmptyMetaKey,
}

/// Session token verification failures
///
/// Both variants are reported to callers as a plain permission denial; the
/// distinction only reaches the server log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature or structure is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,
}
