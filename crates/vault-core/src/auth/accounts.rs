//! Account registration, login and password changes

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::CredentialAuthority;
use crate::error::{Result, VaultError};
use crate::secret::validate::{validate_email, validate_password};
use crate::storage::AccountStore;

/// A registered account; the password is only ever held as a hash
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: &str, password_hash: &str) -> Self {
        Self {
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Account service backing the bootstrap and password operations
pub struct AccountService {
    /// Storage backend
    accounts: Arc<dyn AccountStore>,
    authority: Arc<CredentialAuthority>,
}

impl AccountService {
    /// Create a new account service
    pub fn new(accounts: Arc<dyn AccountStore>, authority: Arc<CredentialAuthority>) -> Self {
        Self {
            accounts,
            authority,
        }
    }

    pub fn authority(&self) -> &Arc<CredentialAuthority> {
        &self.authority
    }

    /// Create an account and return a session token for it
    pub async fn register(&self, email: &str, password: &str) -> Result<String> {
        validate_email(email)?;
        validate_password(password)?;

        let hash = self.authority.hash_password(password)?;
        self.accounts.insert(&Account::new(email, &hash)).await?;

        info!("Registered account: {}", email);
        self.authority.issue_token(email)
    }

    /// Check credentials and return a session token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let account = self
            .accounts
            .find(email)
            .await?
            .ok_or_else(|| VaultError::NotFound(email.to_string()))?;

        if !self.authority.verify_password(password, &account.password_hash) {
            warn!("Failed login for {}", email);
            return Err(VaultError::Unauthenticated);
        }

        debug!("Login succeeded for {}", email);
        self.authority.issue_token(email)
    }

    /// Replace the password of an authenticated subject
    pub async fn change_password(&self, subject: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;

        let hash = self.authority.hash_password(new_password)?;
        match self.accounts.update_password_hash(subject, &hash).await {
            Ok(()) => {
                info!("Changed password for {}", subject);
                Ok(())
            }
            // A valid token for a vanished account is an identity failure.
            Err(VaultError::NotFound(_)) => Err(VaultError::Unauthenticated),
            Err(e) => Err(e),
        }
    }
}
