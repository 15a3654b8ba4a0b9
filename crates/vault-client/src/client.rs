//! HTTP client for the vault
//!
//! Plaintext secrets are validated and sealed locally before they leave the
//! process; fetched payloads are opened with the same codec. The server only
//! ever sees ciphertext.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use vault_core::auth::TOKEN_HEADER;
use vault_core::crypto::SecretString;
use vault_core::{CipherCodec, ErrorBody, Result, Sealable, SecretPayload, VaultError};

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordChangeBody<'a> {
    new_password: &'a str,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

fn transport_err(e: reqwest::Error) -> VaultError {
    VaultError::TransportError(e.to_string())
}

/// Vault client bound to one server and one key pair
pub struct VaultClient {
    http: Client,
    base_url: Url,
    codec: CipherCodec,
    /// Session token from the last register/login
    token: RwLock<Option<SecretString>>,
}

impl VaultClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, codec: CipherCodec) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| VaultError::TransportError(format!("Invalid base URL: {}", e)))?;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(transport_err)?;

        if codec.is_passthrough() {
            warn!("No public key loaded; secrets will be sent unencrypted");
        } else if let Some(chunk) = codec.chunk_size() {
            debug!("Sealing secrets in {}-byte RSA-OAEP blocks", chunk);
        }

        Ok(Self {
            http,
            base_url,
            codec,
            token: RwLock::new(None),
        })
    }

    /// Whether a session token is held
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Create an account and keep its session token
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        self.authenticate(&["v1", "auth", "register"], email, password)
            .await
    }

    /// Log in and keep the session token
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        self.authenticate(&["v1", "auth", "login"], email, password)
            .await
    }

    async fn authenticate(&self, segments: &[&str], email: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url(segments)?)
            .json(&CredentialsBody { email, password })
            .send()
            .await
            .map_err(transport_err)?;
        let body: TokenBody = Self::check(response)
            .await?
            .json()
            .await
            .map_err(transport_err)?;

        *self.token.write().await = Some(SecretString::new(body.token));
        debug!("Authenticated as {}", email);
        Ok(())
    }

    /// Change the password of the logged-in account
    pub async fn change_password(&self, new_password: &str) -> Result<()> {
        let request = self
            .authorized(Method::PUT, &["v1", "auth", "password"])
            .await?
            .json(&PasswordChangeBody { new_password });
        Self::check(request.send().await.map_err(transport_err)?).await?;
        Ok(())
    }

    /// Validate, seal and store a new secret
    pub async fn create<S: Sealable>(&self, meta_key: &str, secret: &S) -> Result<()> {
        let sealed = secret.seal(&self.codec)?;
        let request = self
            .authorized(Method::POST, &Self::record_path::<S>(meta_key))
            .await?
            .json(&sealed);
        Self::check(request.send().await.map_err(transport_err)?).await?;
        Ok(())
    }

    /// Fetch and open a secret
    pub async fn get<S: Sealable>(&self, meta_key: &str) -> Result<S> {
        let request = self
            .authorized(Method::GET, &Self::record_path::<S>(meta_key))
            .await?;
        let sealed: S::Sealed = Self::check(request.send().await.map_err(transport_err)?)
            .await?
            .json()
            .await
            .map_err(transport_err)?;
        S::open(&sealed, &self.codec)
    }

    /// Delete a secret
    pub async fn delete<S: Sealable>(&self, meta_key: &str) -> Result<()> {
        let request = self
            .authorized(Method::DELETE, &Self::record_path::<S>(meta_key))
            .await?;
        Self::check(request.send().await.map_err(transport_err)?).await?;
        Ok(())
    }

    /// Validate, seal and replace an existing secret
    pub async fn change<S: Sealable>(&self, meta_key: &str, secret: &S) -> Result<()> {
        let sealed = secret.seal(&self.codec)?;
        let request = self
            .authorized(Method::PUT, &Self::record_path::<S>(meta_key))
            .await?
            .json(&sealed);
        Self::check(request.send().await.map_err(transport_err)?).await?;
        Ok(())
    }

    fn record_path<S: Sealable>(meta_key: &str) -> [&str; 3] {
        let collection = <S::Sealed as SecretPayload>::CATEGORY.collection();
        ["v1", collection, meta_key]
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VaultError::TransportError("Base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn authorized(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let guard = self.token.read().await;
        let token = guard.as_ref().ok_or(VaultError::Unauthenticated)?;
        Ok(self
            .http
            .request(method, self.url(segments)?)
            .header(TOKEN_HEADER, token.expose()))
    }

    /// Turn an error status into the matching vault error
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => Err(body.into_error()),
            Err(_) => Err(match status {
                StatusCode::NOT_FOUND => VaultError::NotFound(status.to_string()),
                StatusCode::CONFLICT => VaultError::AlreadyExists(status.to_string()),
                StatusCode::FORBIDDEN => VaultError::PermissionDenied,
                StatusCode::UNAUTHORIZED => VaultError::Unauthenticated,
                _ => VaultError::TransportError(format!("Unexpected status {}", status)),
            }),
        }
    }
}
