//! Server settings management
//!
//! Stores non-sensitive configuration in a plain JSON file inside the data
//! directory. Command-line flags override anything loaded here.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::auth::{PasswordScheme, TOKEN_TTL_SECS};
use crate::error::{Result, VaultError};

/// Longest accepted session token lifetime: 30 days
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Application qualifier used to resolve platform directories
const APP_QUALIFIER: (&str, &str, &str) = ("dev", "secret-vault", "secret-vault");

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local maps; lost on restart
    #[default]
    Memory,
    /// SQLite database file
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultSettings {
    /// Settings file version
    pub version: u32,
    /// Socket address the HTTP server binds to
    pub listen_addr: String,
    pub storage: StorageBackend,
    /// SQLite file; defaults to `vault.db` in the data directory
    pub database_path: Option<PathBuf>,
    /// Session token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Global salt for the salted_sha256 scheme
    pub password_salt: String,
    pub password_scheme: PasswordScheme,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            version: 1,
            listen_addr: "127.0.0.1:8080".to_string(),
            storage: StorageBackend::Memory,
            database_path: None,
            token_ttl_secs: TOKEN_TTL_SECS as u64,
            password_salt: "secret-vault".to_string(),
            password_scheme: PasswordScheme::default(),
        }
    }
}

impl VaultSettings {
    /// Session token lifetime, rejected when zero or above [`MAX_TOKEN_TTL_SECS`]
    pub fn token_ttl(&self) -> Result<Duration> {
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(VaultError::InvalidRequest(format!(
                "token TTL must be between 1 and {} seconds, got {}",
                MAX_TOKEN_TTL_SECS, self.token_ttl_secs
            )));
        }
        i64::try_from(self.token_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| VaultError::InvalidRequest("token TTL out of range".to_string()))
    }

    /// Resolve the database path, falling back to the data directory
    pub fn effective_database_path(&self, data_dir: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir.join("vault.db"))
    }
}

/// Platform data directory for the vault
pub fn default_data_dir() -> Result<PathBuf> {
    let (qualifier, organization, application) = APP_QUALIFIER;
    directories::ProjectDirs::from(qualifier, organization, application)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| VaultError::StorageError("Could not determine data directory".into()))
}

/// Settings manager
pub struct SettingsManager {
    settings: VaultSettings,
}

impl SettingsManager {
    /// Load settings from `settings.json` in the given directory
    ///
    /// A missing file yields defaults; a file that exists but does not parse
    /// is an error.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let settings_file = data_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file)?;
        Ok(Self { settings })
    }

    fn load_from_file(path: &Path) -> Result<VaultSettings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(VaultSettings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: VaultSettings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn get(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn into_settings(self) -> VaultSettings {
        self.settings
    }
}
