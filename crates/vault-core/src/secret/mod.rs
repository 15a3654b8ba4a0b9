//! Secret categories, payloads and structural validation

mod plain;
mod types;
pub mod validate;

pub use plain::{Blob, CardDetails, LoginPair, Note, Sealable};
pub use types::{
    BinaryPayload, CardPayload, Category, Ciphertext, CredentialPayload, SecretPayload,
    SecretRecord, TextPayload,
};
pub use validate::Validate;
