//! Secure memory handling with automatic zeroization

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

/// Server-held key for signing session tokens - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct TokenSecret {
    key: Vec<u8>,
}

impl TokenSecret {
    /// Length of generated secrets in bytes
    pub const GENERATED_LEN: usize = 32;

    /// Create a token secret from raw bytes
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Generate a random 256-bit secret
    pub fn generate() -> Self {
        let mut key = vec![0u8; Self::GENERATED_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Parse a hex-encoded secret (must decode to at least 16 bytes)
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let key = hex::decode(encoded.trim())
            .map_err(|e| VaultError::KeyError(format!("Invalid token secret hex: {}", e)))?;
        if key.len() < 16 {
            return Err(VaultError::KeyError(format!(
                "Token secret too short: expected at least 16 bytes, got {}",
                key.len()
            )));
        }
        Ok(Self { key })
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl Clone for TokenSecret {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
        }
    }
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSecret")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Plaintext secret value - automatically zeroed when dropped
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Consume and return the inner value
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
