//! Secret vault server
//!
//! Settings are read from `settings.json` in the data directory and can be
//! overridden by flags or environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use vault_core::settings::default_data_dir;
use vault_core::{
    CredentialAuthority, PasswordScheme, SettingsManager, StorageBackend, TokenSecret,
};
use vault_server::{AppState, VaultServer};

/// Secret vault - stores client-encrypted credentials, cards, notes and files
#[derive(Parser, Debug)]
#[command(name = "secret-vault-server")]
#[command(version)]
#[command(about = "Secret vault - stores client-encrypted secrets behind session tokens")]
struct Args {
    /// Directory holding settings.json and the default database
    #[arg(long, env = "VAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to listen on (e.g. 127.0.0.1:8080)
    #[arg(long, env = "VAULT_LISTEN_ADDR")]
    listen: Option<String>,

    /// Storage backend: memory or sqlite
    #[arg(long, env = "VAULT_STORAGE")]
    storage: Option<StorageBackend>,

    /// SQLite database file
    #[arg(long, env = "VAULT_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Hex-encoded token signing secret; random per process if absent
    #[arg(long, env = "VAULT_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Session token lifetime in seconds
    #[arg(long, env = "VAULT_TOKEN_TTL")]
    token_ttl: Option<u64>,

    /// Global password salt for the salted_sha256 scheme
    #[arg(long, env = "VAULT_PASSWORD_SALT", hide_env_values = true)]
    password_salt: Option<String>,

    /// Password scheme: salted_sha256 or argon2id
    #[arg(long, env = "VAULT_PASSWORD_SCHEME")]
    password_scheme: Option<PasswordScheme>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir().context("Failed to resolve data directory")?,
    };
    let mut settings = SettingsManager::new(&data_dir)
        .context("Invalid settings.json")?
        .into_settings();

    if let Some(listen) = args.listen {
        settings.listen_addr = listen;
    }
    if let Some(storage) = args.storage {
        settings.storage = storage;
    }
    if let Some(db_path) = args.db_path {
        settings.database_path = Some(db_path);
    }
    if let Some(ttl) = args.token_ttl {
        settings.token_ttl_secs = ttl;
    }
    if let Some(salt) = args.password_salt {
        settings.password_salt = salt;
    }
    if let Some(scheme) = args.password_scheme {
        settings.password_scheme = scheme;
    }

    let secret = match args.token_secret {
        Some(hex) => TokenSecret::from_hex(&hex).context("Invalid token secret")?,
        None => {
            warn!("No token secret configured; generated one for this process only");
            TokenSecret::generate()
        }
    };

    let ttl = settings.token_ttl().context("Invalid token TTL")?;
    let authority = Arc::new(
        CredentialAuthority::new(
            secret,
            settings.password_scheme,
            settings.password_salt.clone(),
        )
        .with_token_ttl(ttl),
    );

    let database_path = settings.effective_database_path(&data_dir);
    let state = AppState::open(settings.storage, &database_path, authority)
        .await
        .context("Failed to open storage")?;

    info!(
        "Starting secret vault (storage: {:?}, token TTL: {}s)",
        settings.storage, settings.token_ttl_secs
    );
    VaultServer::new(state, settings.listen_addr).run().await?;

    Ok(())
}
