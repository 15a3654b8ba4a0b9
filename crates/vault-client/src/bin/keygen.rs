//! Generate the RSA key pair used to seal vault secrets
//!
//! Writes `vault_key.pem` (PKCS#8, owner-only permissions on unix) and
//! `vault_key.pub.pem` (SPKI) into the target directory.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use vault_core::crypto::{generate_key_pair, write_key_pair, KeyPairPaths, DEFAULT_KEY_BITS};

/// Secret vault key-pair generator
#[derive(Parser, Debug)]
#[command(name = "secret-vault-keygen")]
#[command(version)]
#[command(about = "Generate the RSA key pair used to encrypt vault secrets")]
struct Args {
    /// Output directory
    #[arg(long, short, default_value = ".")]
    out_dir: PathBuf,

    /// RSA modulus size in bits
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    bits: usize,

    /// Overwrite an existing key pair
    #[arg(long)]
    force: bool,
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

    let existing = KeyPairPaths::in_dir(&args.out_dir);
    if !args.force && (existing.private_key.exists() || existing.public_key.exists()) {
        bail!(
            "Key pair already present in {:?}; pass --force to replace it",
            args.out_dir
        );
    }

    info!("Generating {}-bit RSA key pair", args.bits);
    let bits = args.bits;
    let key = tokio::task::spawn_blocking(move || generate_key_pair(bits))
        .await
        .context("Key generation task failed")??;

    let paths = write_key_pair(&args.out_dir, &key)
        .await
        .context("Failed to write key pair")?;

    info!("Private key: {:?}", paths.private_key);
    info!("Public key: {:?}", paths.public_key);
    Ok(())
}
