//! Access gate middleware
//!
//! Every request except account registration, login and the health check
//! must carry a session token in the `x-vault-token` header. Requests with a
//! missing, malformed or expired token are answered with `403` before the
//! handler runs. Accepted requests get an [`Identity`] extension holding the
//! token subject.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use vault_core::auth::TOKEN_HEADER;
use vault_core::{CredentialAuthority, VaultError};

use crate::error::ApiError;
use crate::routes::{HEALTH_PATH, LOGIN_PATH, REGISTER_PATH};

/// Authenticated caller, inserted into request extensions by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account email taken from the token
    pub subject: String,
}

/// Paths reachable without a token
const EXEMPT_PATHS: [&str; 3] = [REGISTER_PATH, LOGIN_PATH, HEALTH_PATH];

fn is_exempt(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path)
}

/// Middleware enforcing session tokens
pub async fn access_gate(
    State(authority): State<Arc<CredentialAuthority>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_exempt(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let Some(token) = token else {
        debug!("Rejected {} without session token", request.uri().path());
        return Err(VaultError::PermissionDenied.into());
    };

    let subject = authority
        .verify_token(token)
        .map_err(|_| ApiError(VaultError::PermissionDenied))?;

    request.extensions_mut().insert(Identity { subject });
    Ok(next.run(request).await)
}
