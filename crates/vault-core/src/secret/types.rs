//! Secret record and payload types as stored by the vault

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Secret category; determines the payload shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Credential,
    Card,
    Text,
    Binary,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Credential,
        Category::Card,
        Category::Text,
        Category::Binary,
    ];

    /// Stable identifier used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Credential => "credential",
            Category::Card => "card",
            Category::Text => "text",
            Category::Binary => "binary",
        }
    }

    /// Collection name used in HTTP paths
    pub fn collection(&self) -> &'static str {
        match self {
            Category::Credential => "credentials",
            Category::Card => "cards",
            Category::Text => "texts",
            Category::Binary => "binaries",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s || c.collection() == s)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Opaque ciphertext blob produced by the client codec
///
/// Serialized as standard base64. The vault never inspects the bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for Ciphertext {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Ciphertext {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ciphertext({} bytes)", self.0.len())
    }
}

impl Serialize for Ciphertext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Ciphertext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(Ciphertext)
            .map_err(serde::de::Error::custom)
    }
}

/// A payload shape the vault can store
pub trait SecretPayload:
    Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static
{
    /// Category this payload belongs to
    const CATEGORY: Category;

    /// Structural checks that can run on sealed data, before any storage access
    fn check(&self) -> Result<(), ValidationError>;

    /// Whether the payload carries no data at all
    fn is_empty(&self) -> bool;
}

fn require(field: &Ciphertext, err: ValidationError) -> Result<(), ValidationError> {
    if field.is_empty() {
        Err(err)
    } else {
        Ok(())
    }
}

/// Payment card; every field individually encrypted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPayload {
    pub number: Ciphertext,
    pub period: Ciphertext,
    pub cvv: Ciphertext,
    pub full_name: Ciphertext,
}

impl SecretPayload for CardPayload {
    const CATEGORY: Category = Category::Card;

    fn check(&self) -> Result<(), ValidationError> {
        require(&self.number, ValidationError::InvalidNumber)?;
        require(&self.period, ValidationError::InvalidPeriod)?;
        require(&self.cvv, ValidationError::InvalidCvv)?;
        require(&self.full_name, ValidationError::InvalidFullName)
    }

    fn is_empty(&self) -> bool {
        self.number.is_empty()
            && self.period.is_empty()
            && self.cvv.is_empty()
            && self.full_name.is_empty()
    }
}

/// Login/password pair; both encrypted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPayload {
    pub login: Ciphertext,
    pub password: Ciphertext,
}

impl SecretPayload for CredentialPayload {
    const CATEGORY: Category = Category::Credential;

    fn check(&self) -> Result<(), ValidationError> {
        require(&self.login, ValidationError::EmptyField("login"))?;
        require(&self.password, ValidationError::EmptyField("password"))
    }

    fn is_empty(&self) -> bool {
        self.login.is_empty() && self.password.is_empty()
    }
}

/// Free-form encrypted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    pub body: Ciphertext,
}

impl SecretPayload for TextPayload {
    const CATEGORY: Category = Category::Text;

    // Emptiness is rejected by the calling layer.
    fn check(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Encrypted binary blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryPayload {
    pub data: Ciphertext,
}

impl SecretPayload for BinaryPayload {
    const CATEGORY: Category = Category::Binary;

    fn check(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A stored secret: caller-chosen meta key plus category payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord<P> {
    pub meta_key: String,
    pub payload: P,
}

impl<P: SecretPayload> SecretRecord<P> {
    pub fn new(meta_key: impl Into<String>, payload: P) -> Self {
        Self {
            meta_key: meta_key.into(),
            payload,
        }
    }

    pub fn category(&self) -> Category {
        P::CATEGORY
    }
}
