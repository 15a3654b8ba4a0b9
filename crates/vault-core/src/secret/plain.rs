//! Plaintext secrets as handled on the client
//!
//! Each plaintext type validates itself, then seals field by field into the
//! matching stored payload. Opening reverses the codec and re-reads UTF-8.
//! All plaintext values are zeroed when dropped.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::types::{
    BinaryPayload, CardPayload, Ciphertext, CredentialPayload, SecretPayload, TextPayload,
};
use super::validate::{validate_card, validate_login_pair, Validate};
use crate::crypto::CipherCodec;
use crate::error::{Result, ValidationError, VaultError};

/// Plaintext type that can be sealed into a stored payload
pub trait Sealable: Validate + Sized {
    type Sealed: SecretPayload;

    /// Validate, then encrypt every field
    fn seal(&self, codec: &CipherCodec) -> Result<Self::Sealed>;

    /// Decrypt every field of a stored payload
    fn open(sealed: &Self::Sealed, codec: &CipherCodec) -> Result<Self>;
}

fn seal_str(codec: &CipherCodec, value: &str) -> Result<Ciphertext> {
    codec.encrypt(value.as_bytes()).map(Ciphertext::new)
}

fn open_str(codec: &CipherCodec, field: &Ciphertext) -> Result<String> {
    let bytes = codec.decrypt(field.as_bytes())?;
    String::from_utf8(bytes)
        .map_err(|e| VaultError::DecryptionError(format!("Invalid UTF-8: {}", e)))
}

macro_rules! redacted_debug {
    ($ty:ident) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty)).finish_non_exhaustive()
            }
        }
    };
}

/// Payment card in plaintext
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CardDetails {
    pub number: String,
    /// Expiry in `MM.YYYY`
    pub period: String,
    pub cvv: String,
    pub full_name: String,
}

redacted_debug!(CardDetails);

impl CardDetails {
    pub fn new(number: &str, period: &str, cvv: &str, full_name: &str) -> Self {
        Self {
            number: number.to_string(),
            period: period.to_string(),
            cvv: cvv.to_string(),
            full_name: full_name.to_string(),
        }
    }
}

impl Validate for CardDetails {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_card(&self.number, &self.period, &self.cvv, &self.full_name)
    }
}

impl Sealable for CardDetails {
    type Sealed = CardPayload;

    fn seal(&self, codec: &CipherCodec) -> Result<CardPayload> {
        self.validate()?;
        Ok(CardPayload {
            number: seal_str(codec, &self.number)?,
            period: seal_str(codec, &self.period)?,
            cvv: seal_str(codec, &self.cvv)?,
            full_name: seal_str(codec, &self.full_name)?,
        })
    }

    fn open(sealed: &CardPayload, codec: &CipherCodec) -> Result<Self> {
        Ok(Self {
            number: open_str(codec, &sealed.number)?,
            period: open_str(codec, &sealed.period)?,
            cvv: open_str(codec, &sealed.cvv)?,
            full_name: open_str(codec, &sealed.full_name)?,
        })
    }
}

/// Login/password pair in plaintext
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct LoginPair {
    pub login: String,
    pub password: String,
}

redacted_debug!(LoginPair);

impl LoginPair {
    pub fn new(login: &str, password: &str) -> Self {
        Self {
            login: login.to_string(),
            password: password.to_string(),
        }
    }
}

impl Validate for LoginPair {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_login_pair(&self.login, &self.password)
    }
}

impl Sealable for LoginPair {
    type Sealed = CredentialPayload;

    fn seal(&self, codec: &CipherCodec) -> Result<CredentialPayload> {
        self.validate()?;
        Ok(CredentialPayload {
            login: seal_str(codec, &self.login)?,
            password: seal_str(codec, &self.password)?,
        })
    }

    fn open(sealed: &CredentialPayload, codec: &CipherCodec) -> Result<Self> {
        Ok(Self {
            login: open_str(codec, &sealed.login)?,
            password: open_str(codec, &sealed.password)?,
        })
    }
}

/// Free-form text note in plaintext
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Note {
    pub body: String,
}

redacted_debug!(Note);

impl Note {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
        }
    }
}

impl Validate for Note {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.body.is_empty() {
            return Err(ValidationError::EmptyPayload);
        }
        Ok(())
    }
}

impl Sealable for Note {
    type Sealed = TextPayload;

    fn seal(&self, codec: &CipherCodec) -> Result<TextPayload> {
        self.validate()?;
        Ok(TextPayload {
            body: seal_str(codec, &self.body)?,
        })
    }

    fn open(sealed: &TextPayload, codec: &CipherCodec) -> Result<Self> {
        Ok(Self {
            body: open_str(codec, &sealed.body)?,
        })
    }
}

/// Arbitrary bytes in plaintext
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Blob {
    pub data: Vec<u8>,
}

redacted_debug!(Blob);

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Validate for Blob {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.data.is_empty() {
            return Err(ValidationError::EmptyPayload);
        }
        Ok(())
    }
}

impl Sealable for Blob {
    type Sealed = BinaryPayload;

    fn seal(&self, codec: &CipherCodec) -> Result<BinaryPayload> {
        self.validate()?;
        Ok(BinaryPayload {
            data: codec.encrypt(&self.data)?.into(),
        })
    }

    fn open(sealed: &BinaryPayload, codec: &CipherCodec) -> Result<Self> {
        Ok(Self {
            data: codec.decrypt(sealed.data.as_bytes())?,
        })
    }
}
