//! Password hashing
//!
//! Two schemes are supported:
//! - `salted_sha256`: hex(SHA-256(password || salt)) with one global salt.
//!   This is the compatibility scheme and the default. It is fast and the salt
//!   is shared, so it offers little protection against offline attack.
//! - `argon2id`: PHC-formatted Argon2id hash with a random per-account salt.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{Result, VaultError};

/// Compute hex(SHA-256(password || salt))
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Password hashing scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordScheme {
    /// Single-pass SHA-256 with the global salt
    #[default]
    SaltedSha256,
    /// Argon2id with a per-account salt
    Argon2id,
}

impl std::str::FromStr for PasswordScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "salted_sha256" | "sha256" => Ok(Self::SaltedSha256),
            "argon2id" | "argon2" => Ok(Self::Argon2id),
            other => Err(format!("unknown password scheme: {}", other)),
        }
    }
}

/// Hashes and verifies account passwords under the configured scheme
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    scheme: PasswordScheme,
    salt: String,
}

impl PasswordHasher {
    /// Create a hasher; `salt` is only used by [`PasswordScheme::SaltedSha256`]
    pub fn new(scheme: PasswordScheme, salt: impl Into<String>) -> Self {
        Self {
            scheme,
            salt: salt.into(),
        }
    }

    pub fn scheme(&self) -> PasswordScheme {
        self.scheme
    }

    /// Hash a password for storage
    pub fn hash(&self, password: &str) -> Result<String> {
        match self.scheme {
            PasswordScheme::SaltedSha256 => Ok(hash_password(password, &self.salt)),
            PasswordScheme::Argon2id => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| VaultError::CryptoError(e.to_string()))
            }
        }
    }

    /// Check a password against a stored hash
    ///
    /// The stored hash format decides the scheme, so accounts created before a
    /// scheme switch keep working.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        if stored.starts_with("$argon2") {
            return match PasswordHash::new(stored) {
                Ok(parsed) => Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            };
        }
        hash_password(password, &self.salt)
            .as_bytes()
            .ct_eq(stored.as_bytes())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salted_sha256_is_deterministic() {
        let a = hash_password("password1", "pepper");
        let b = hash_password("password1", "pepper");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_password("password1", "other"));
        assert_ne!(a, hash_password("password2", "pepper"));
    }

    #[test]
    fn test_salted_sha256_known_vector() {
        // sha256("abc")
        assert_eq!(
            hash_password("ab", "c"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hasher_verify_sha256() {
        let hasher = PasswordHasher::new(PasswordScheme::SaltedSha256, "pepper");
        let stored = hasher.hash("correct horse").unwrap();
        assert!(hasher.verify("correct horse", &stored));
        assert!(!hasher.verify("wrong horse", &stored));
    }

    #[test]
    fn test_hasher_verify_rejects_near_misses() {
        let hasher = PasswordHasher::new(PasswordScheme::SaltedSha256, "pepper");
        let stored = hasher.hash("correct horse").unwrap();

        // Same length, last hex digit flipped.
        let mut flipped = stored.clone();
        let last = if flipped.ends_with('0') { '1' } else { '0' };
        flipped.pop();
        flipped.push(last);
        assert!(!hasher.verify("correct horse", &flipped));

        assert!(!hasher.verify("correct horse", &stored[..32]));
        assert!(!hasher.verify("correct horse", &format!("{}00", stored)));
        assert!(!hasher.verify("correct horse", ""));
    }

    #[test]
    fn test_hasher_verify_argon2() {
        let hasher = PasswordHasher::new(PasswordScheme::Argon2id, "unused");
        let stored = hasher.hash("correct horse").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &stored));
        assert!(!hasher.verify("wrong horse", &stored));

        // Per-account salts: same password, different hashes.
        assert_ne!(stored, hasher.hash("correct horse").unwrap());
    }

    #[test]
    fn test_verify_follows_stored_format() {
        let legacy = PasswordHasher::new(PasswordScheme::SaltedSha256, "pepper");
        let stored = legacy.hash("password1").unwrap();

        let upgraded = PasswordHasher::new(PasswordScheme::Argon2id, "pepper");
        assert!(upgraded.verify("password1", &stored));
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!("argon2id".parse::<PasswordScheme>(), Ok(PasswordScheme::Argon2id));
        assert_eq!(
            "salted_sha256".parse::<PasswordScheme>(),
            Ok(PasswordScheme::SaltedSha256)
        );
        assert!("md5".parse::<PasswordScheme>().is_err());
    }
}
