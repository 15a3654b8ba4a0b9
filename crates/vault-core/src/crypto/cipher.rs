//! Chunked RSA-OAEP encryption
//!
//! A single OAEP operation protects at most `key_size - 2 * HASH_SIZE - 2`
//! bytes. Larger plaintext is split into consecutive chunks of exactly that
//! size (the last one may be shorter), each chunk is encrypted on its own and
//! the resulting `key_size` blocks are concatenated in order:
//!
//! `block_0 || block_1 || ... || block_n` where every block is `key_size` bytes.
//!
//! A missing key turns both directions into a passthrough, which is how the
//! vault runs with encryption disabled.

use rsa::{traits::PublicKeyParts, Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{Result, VaultError};

/// Output size of the OAEP hash (SHA-256) in bytes
pub const HASH_SIZE: usize = 32;

/// Largest plaintext chunk a single OAEP operation accepts for a key of
/// `key_size` bytes
pub fn max_chunk_size(key_size: usize) -> usize {
    key_size.saturating_sub(2 * HASH_SIZE + 2)
}

fn padding() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Encrypt plaintext of any length with the given public key
///
/// # Arguments
/// * `public_key` - Recipient key; `None` returns the plaintext unchanged
/// * `plaintext` - The data to encrypt
///
/// # Returns
/// Concatenated `key_size`-byte OAEP blocks (empty for empty plaintext)
pub fn encrypt(public_key: Option<&RsaPublicKey>, plaintext: &[u8]) -> Result<Vec<u8>> {
    let Some(key) = public_key else {
        return Ok(plaintext.to_vec());
    };

    let key_size = key.size();
    let chunk_size = max_chunk_size(key_size);
    if chunk_size == 0 {
        return Err(VaultError::EncryptionError(format!(
            "key of {} bytes is too small for OAEP-SHA256",
            key_size
        )));
    }

    let blocks = plaintext.len().div_ceil(chunk_size);
    let mut ciphertext = Vec::with_capacity(blocks * key_size);
    let mut rng = rand::thread_rng();

    for chunk in plaintext.chunks(chunk_size) {
        let block = key
            .encrypt(&mut rng, padding(), chunk)
            .map_err(|e| VaultError::EncryptionError(e.to_string()))?;
        ciphertext.extend_from_slice(&block);
    }

    Ok(ciphertext)
}

/// Decrypt ciphertext produced by [`encrypt`]
///
/// # Arguments
/// * `private_key` - The matching private key; `None` returns the input unchanged
/// * `ciphertext` - Concatenated OAEP blocks
///
/// # Returns
/// The original plaintext, or `DecryptionError` when the length is not a
/// whole number of blocks or any block fails OAEP unpadding
pub fn decrypt(private_key: Option<&RsaPrivateKey>, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let Some(key) = private_key else {
        return Ok(ciphertext.to_vec());
    };

    let key_size = key.size();
    if ciphertext.len() % key_size != 0 {
        return Err(VaultError::DecryptionError(format!(
            "ciphertext length {} is not a multiple of the {}-byte block size",
            ciphertext.len(),
            key_size
        )));
    }

    let mut plaintext = Vec::with_capacity(ciphertext.len() / key_size * max_chunk_size(key_size));
    for (index, block) in ciphertext.chunks(key_size).enumerate() {
        let chunk = key
            .decrypt(padding(), block)
            .map_err(|_| VaultError::DecryptionError(format!("block {} failed OAEP unpadding", index)))?;
        plaintext.extend_from_slice(&chunk);
    }

    Ok(plaintext)
}

/// Key-holding wrapper around [`encrypt`] and [`decrypt`]
///
/// Carries an optional private key (for opening) and an optional public key
/// (for sealing). [`CipherCodec::passthrough`] holds neither and leaves data
/// untouched.
#[derive(Clone, Default)]
pub struct CipherCodec {
    public_key: Option<RsaPublicKey>,
    private_key: Option<RsaPrivateKey>,
}

impl CipherCodec {
    /// Codec able to both seal and open, derived from a private key
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self {
            public_key: Some(private_key.to_public_key()),
            private_key: Some(private_key),
        }
    }

    /// Codec that can only seal
    pub fn seal_only(public_key: RsaPublicKey) -> Self {
        Self {
            public_key: Some(public_key),
            private_key: None,
        }
    }

    /// Codec with encryption disabled
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Whether this codec actually encrypts
    pub fn is_passthrough(&self) -> bool {
        self.public_key.is_none()
    }

    /// Plaintext bytes protected per block, if a key is loaded
    pub fn chunk_size(&self) -> Option<usize> {
        self.public_key.as_ref().map(|k| max_chunk_size(k.size()))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt(self.public_key.as_ref(), plaintext)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        decrypt(self.private_key.as_ref(), ciphertext)
    }
}

impl std::fmt::Debug for CipherCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherCodec")
            .field("public_key", &self.public_key.as_ref().map(|k| k.size() * 8))
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
