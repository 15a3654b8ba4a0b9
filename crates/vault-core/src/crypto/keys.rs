//! RSA key-pair generation and PEM import/export
//!
//! Private keys are written as PKCS#8 PEM, public keys as SPKI PEM. Legacy
//! PKCS#1 PEM is accepted on load.

use std::path::{Path, PathBuf};

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{debug, info};

use super::SecretString;
use crate::error::{Result, VaultError};

/// Default modulus size for generated keys
pub const DEFAULT_KEY_BITS: usize = 4096;

/// File names used by [`write_key_pair`]
const PRIVATE_KEY_FILE: &str = "vault_key.pem";
const PUBLIC_KEY_FILE: &str = "vault_key.pub.pem";

/// Locations of an exported key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

impl KeyPairPaths {
    /// Standard file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            private_key: dir.join(PRIVATE_KEY_FILE),
            public_key: dir.join(PUBLIC_KEY_FILE),
        }
    }
}

/// Generate a fresh RSA private key with a modulus of `bits` bits
pub fn generate_key_pair(bits: usize) -> Result<RsaPrivateKey> {
    debug!("Generating {}-bit RSA key pair", bits);
    RsaPrivateKey::new(&mut rand::thread_rng(), bits)
        .map_err(|e| VaultError::KeyError(e.to_string()))
}

/// Serialize a private key as PKCS#8 PEM
pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<SecretString> {
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| VaultError::KeyError(e.to_string()))?;
    Ok(SecretString::new(pem.as_str().to_owned()))
}

/// Serialize a public key as SPKI PEM
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| VaultError::KeyError(e.to_string()))
}

/// Parse a private key from PKCS#8 or PKCS#1 PEM
pub fn load_private_key_pem(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| VaultError::KeyError(format!("Invalid private key PEM: {}", e)))
}

/// Parse a public key from SPKI or PKCS#1 PEM
pub fn load_public_key_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| VaultError::KeyError(format!("Invalid public key PEM: {}", e)))
}

/// Write both halves of a key pair into `dir`
pub async fn write_key_pair(dir: &Path, key: &RsaPrivateKey) -> Result<KeyPairPaths> {
    tokio::fs::create_dir_all(dir).await?;
    let paths = KeyPairPaths::in_dir(dir);

    let private_pem = private_key_to_pem(key)?;
    let public_pem = public_key_to_pem(&key.to_public_key())?;

    tokio::fs::write(&paths.private_key, private_pem.expose()).await?;
    restrict_permissions(&paths.private_key).await?;
    tokio::fs::write(&paths.public_key, public_pem).await?;

    info!("Wrote key pair to {:?}", dir);
    Ok(paths)
}

/// Read a private key PEM file
pub async fn read_private_key(path: &Path) -> Result<RsaPrivateKey> {
    let pem = SecretString::new(tokio::fs::read_to_string(path).await?);
    load_private_key_pem(pem.expose())
}

/// Read a public key PEM file
pub async fn read_public_key(path: &Path) -> Result<RsaPublicKey> {
    let pem = tokio::fs::read_to_string(path).await?;
    load_public_key_pem(&pem)
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
