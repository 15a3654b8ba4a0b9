//! # vault-client
//!
//! Client side of the secret vault: plaintext secrets are validated and
//! encrypted with the caller's RSA key pair before submission, and decrypted
//! after retrieval.

mod client;

pub use client::VaultClient;
pub use vault_core::{Blob, CardDetails, CipherCodec, LoginPair, Note};
