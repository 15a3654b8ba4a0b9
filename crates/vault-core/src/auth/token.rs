//! Signed session tokens
//!
//! Token format: `{claims_b64url}.{tag_b64url}`
//! - claims: JSON `{"sub": <email>, "iat": <unix secs>, "exp": <unix secs>}`
//! - tag: HMAC-SHA256 over the encoded claims, keyed with the server secret
//!
//! Tokens are stateless: nothing is persisted and there is no revocation
//! list, a token simply stops verifying once `exp` is reached.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::crypto::TokenSecret;
use crate::error::{Result, TokenError, VaultError};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a session token: 10 minutes
pub const TOKEN_TTL_SECS: i64 = 10 * 60;

/// Request header carrying the session token
pub const TOKEN_HEADER: &str = "x-vault-token";

/// Claims embedded in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expires at (Unix timestamp, seconds)
    pub exp: i64,
}

impl Claims {
    /// Remaining lifetime relative to `now`, zero once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        Duration::seconds((self.exp - now.timestamp()).max(0))
    }
}

/// Issues and verifies session tokens with a single server-held secret
#[derive(Debug, Clone)]
pub struct TokenSigner {
    secret: TokenSecret,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer with the default 10 minute TTL
    pub fn new(secret: TokenSecret) -> Self {
        Self {
            secret,
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    /// Override the token lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` valid from now
    pub fn issue(&self, subject: &str) -> Result<String> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| VaultError::CryptoError("Token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mut mac = self
            .mac()
            .map_err(|_| VaultError::CryptoError("Invalid token secret".to_string()))?;
        mac.update(encoded.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        debug!("Issued token for {} expiring at {}", claims.sub, claims.exp);
        Ok(format!("{}.{}", encoded, tag))
    }

    /// Verify a token and return its subject
    pub fn verify(&self, token: &str) -> std::result::Result<String, TokenError> {
        self.verify_at(token, Utc::now()).map(|claims| claims.sub)
    }

    /// Verify a token against the clock value `now`
    ///
    /// The signature is checked before the claims are even decoded, so a
    /// forged token can never be reported as merely expired.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Claims, TokenError> {
        let (encoded, tag) = token.split_once('.').ok_or(TokenError::Invalid)?;
        let tag = URL_SAFE_NO_PAD.decode(tag).map_err(|_| TokenError::Invalid)?;

        let mut mac = self.mac().map_err(|_| TokenError::Invalid)?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&tag).map_err(|_| TokenError::Invalid)?;

        let json = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| TokenError::Invalid)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Invalid)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self) -> std::result::Result<HmacSha256, hmac::digest::InvalidLength> {
        <HmacSha256 as Mac>::new_from_slice(self.secret.as_bytes())
    }
}

/// Issue a token for `subject` signed with `secret_key`
pub fn issue_token(subject: &str, secret_key: &TokenSecret) -> Result<String> {
    TokenSigner::new(secret_key.clone()).issue(subject)
}

/// Verify `token` against `secret_key`, returning the embedded subject
pub fn verify_token(token: &str, secret_key: &TokenSecret) -> std::result::Result<String, TokenError> {
    TokenSigner::new(secret_key.clone()).verify(token)
}
