//! Credential authority: password hashing plus session-token minting and checking

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use super::password::{PasswordHasher, PasswordScheme};
use super::token::TokenSigner;
use crate::crypto::TokenSecret;
use crate::error::{Result, TokenError};

/// Holds the server secrets used to authenticate callers
#[derive(Debug, Clone)]
pub struct CredentialAuthority {
    hasher: PasswordHasher,
    signer: TokenSigner,
}

impl CredentialAuthority {
    /// Create an authority using the given token secret and password scheme
    pub fn new(secret: TokenSecret, scheme: PasswordScheme, salt: impl Into<String>) -> Self {
        let hasher = PasswordHasher::new(scheme, salt);
        if hasher.scheme() == PasswordScheme::SaltedSha256 {
            warn!("Password scheme salted_sha256 uses one global salt; prefer argon2id");
        }
        Self {
            hasher,
            signer: TokenSigner::new(secret),
        }
    }

    /// Override the session token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.signer = self.signer.with_ttl(ttl);
        self
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.hasher.hash(password)
    }

    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.hasher.verify(password, stored_hash)
    }

    pub fn issue_token(&self, subject: &str) -> Result<String> {
        self.signer.issue(subject)
    }

    /// Verify a token, logging why it was rejected
    pub fn verify_token(&self, token: &str) -> std::result::Result<String, TokenError> {
        let now = Utc::now();
        match self.signer.verify_at(token, now) {
            Ok(claims) => {
                debug!(
                    "Token verified for {} ({}s left)",
                    claims.sub,
                    claims.remaining(now).num_seconds()
                );
                Ok(claims.sub)
            }
            Err(TokenError::Expired) => {
                warn!("Rejected expired session token");
                Err(TokenError::Expired)
            }
            Err(TokenError::Invalid) => {
                warn!("Rejected invalid session token");
                Err(TokenError::Invalid)
            }
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }
}
