//! Cryptographic primitives for client-side secret protection
//!
//! This module provides:
//! - Chunked RSA-OAEP (SHA-256) encryption for arbitrarily large payloads
//! - RSA key-pair generation and PEM import/export
//! - Secure memory handling with zeroize

mod cipher;
mod keys;
mod secure_memory;

pub use cipher::{decrypt, encrypt, max_chunk_size, CipherCodec, HASH_SIZE};
pub use keys::{
    generate_key_pair, load_private_key_pem, load_public_key_pem, private_key_to_pem,
    public_key_to_pem, read_private_key, read_public_key, write_key_pair, KeyPairPaths,
    DEFAULT_KEY_BITS,
};
pub use secure_memory::{SecretString, TokenSecret};

pub use rsa::{RsaPrivateKey, RsaPublicKey};
