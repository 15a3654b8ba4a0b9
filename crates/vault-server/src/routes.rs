//! HTTP routes: account bootstrap plus one CRUD collection per category

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;
use vault_core::{
    BinaryPayload, CardPayload, CredentialPayload, SecretPayload, SecretRecord, TextPayload,
    ValidationError,
};

use crate::error::ApiError;
use crate::gate::{access_gate, Identity};
use crate::state::{AppState, VaultFor};

pub const REGISTER_PATH: &str = "/v1/auth/register";
pub const LOGIN_PATH: &str = "/v1/auth/login";
pub const PASSWORD_PATH: &str = "/v1/auth/password";
pub const HEALTH_PATH: &str = "/health";

/// Email and password submitted to register or log in
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub new_password: String,
}

/// Build the full application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(REGISTER_PATH, post(register))
        .route(LOGIN_PATH, post(login))
        .route(PASSWORD_PATH, put(change_password))
        .nest("/v1/credentials", collection::<CredentialPayload>())
        .nest("/v1/cards", collection::<CardPayload>())
        .nest("/v1/texts", collection::<TextPayload>())
        .nest("/v1/binaries", collection::<BinaryPayload>())
        .layer(from_fn_with_state(state.authority().clone(), access_gate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CRUD routes for one payload type
fn collection<P>() -> Router<Arc<AppState>>
where
    P: SecretPayload,
    AppState: VaultFor<P>,
{
    Router::new().route(
        "/:meta_key",
        post(create_secret::<P>)
            .get(get_secret::<P>)
            .put(change_secret::<P>)
            .delete(delete_secret::<P>),
    )
}

/// Health check endpoint
async fn health() -> &'static str {
    "OK"
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.accounts.register(&body.email, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.accounts.login(&body.email, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<PasswordChange>,
) -> Result<StatusCode, ApiError> {
    state
        .accounts
        .change_password(&identity.subject, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn non_empty<P: SecretPayload>(payload: &P) -> Result<(), ApiError> {
    if payload.is_empty() {
        return Err(ValidationError::EmptyPayload.into());
    }
    Ok(())
}

async fn create_secret<P>(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(meta_key): Path<String>,
    Json(payload): Json<P>,
) -> Result<StatusCode, ApiError>
where
    P: SecretPayload,
    AppState: VaultFor<P>,
{
    non_empty(&payload)?;
    let record = SecretRecord::new(meta_key, payload);
    <AppState as VaultFor<P>>::vault(&state)
        .create(&identity.subject, &record)
        .await?;
    Ok(StatusCode::CREATED)
}

async fn get_secret<P>(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(meta_key): Path<String>,
) -> Result<Json<P>, ApiError>
where
    P: SecretPayload,
    AppState: VaultFor<P>,
{
    let record = <AppState as VaultFor<P>>::vault(&state)
        .get(&identity.subject, &meta_key)
        .await?;
    debug!("Served {} record {} to {}", P::CATEGORY, meta_key, identity.subject);
    Ok(Json(record.payload))
}

async fn delete_secret<P>(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(meta_key): Path<String>,
) -> Result<StatusCode, ApiError>
where
    P: SecretPayload,
    AppState: VaultFor<P>,
{
    <AppState as VaultFor<P>>::vault(&state)
        .delete(&identity.subject, &meta_key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_secret<P>(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(meta_key): Path<String>,
    Json(payload): Json<P>,
) -> Result<StatusCode, ApiError>
where
    P: SecretPayload,
    AppState: VaultFor<P>,
{
    non_empty(&payload)?;
    let record = SecretRecord::new(meta_key, payload);
    <AppState as VaultFor<P>>::vault(&state)
        .change(&identity.subject, &record)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use vault_core::auth::TOKEN_HEADER;
    use vault_core::{CredentialAuthority, PasswordScheme, SqliteStore, TokenSecret};

    fn authority() -> Arc<CredentialAuthority> {
        Arc::new(CredentialAuthority::new(
            TokenSecret::generate(),
            PasswordScheme::SaltedSha256,
            "salt",
        ))
    }

    fn app() -> Router {
        router(Arc::new(AppState::in_memory(authority())))
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_token(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                REGISTER_PATH,
                None,
                json!({"email": "a@b.com", "password": "password1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let response = app()
            .oneshot(empty_request("GET", HEALTH_PATH, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_conflict_and_login() {
        let app = app();
        register_token(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                REGISTER_PATH,
                None,
                json!({"email": "a@b.com", "password": "password2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "already_exists");

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                LOGIN_PATH,
                None,
                json!({"email": "a@b.com", "password": "wrong-password"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(json_request(
                "POST",
                LOGIN_PATH,
                None,
                json!({"email": "nobody@b.com", "password": "password1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vault_routes_require_token() {
        let app = app();
        for uri in ["/v1/credentials/k", "/v1/cards/k", "/v1/texts/k", "/v1/binaries/k"] {
            let response = app
                .clone()
                .oneshot(empty_request("GET", uri, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(body_json(response).await["code"], "permission_denied");
        }

        let response = app
            .oneshot(json_request(
                "PUT",
                PASSWORD_PATH,
                None,
                json!({"new_password": "password2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_text_crud() {
        let app = app();
        let token = register_token(&app).await;
        let uri = "/v1/texts/diary";

        // "aGVsbG8=" is base64 for "hello"
        let response = app
            .clone()
            .oneshot(json_request("POST", uri, Some(&token), json!({"body": "aGVsbG8="})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request("POST", uri, Some(&token), json!({"body": "aGVsbG8="})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(empty_request("GET", uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"body": "aGVsbG8="}));

        let response = app
            .clone()
            .oneshot(json_request("PUT", uri, Some(&token), json!({"body": "d29ybGQ="})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(empty_request("GET", uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "not_found");
    }

    #[tokio::test]
    async fn test_change_missing_is_not_found() {
        let app = app();
        let token = register_token(&app).await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/v1/binaries/absent",
                Some(&token),
                json!({"data": "AAEC"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_payloads_rejected() {
        let app = app();
        let token = register_token(&app).await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/v1/texts/n", Some(&token), json!({"body": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid_argument");

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/credentials/mail",
                Some(&token),
                json!({"login": "dXNlcg==", "password": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_change_password_route() {
        let app = app();
        let token = register_token(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                PASSWORD_PATH,
                Some(&token),
                json!({"new_password": "short"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                PASSWORD_PATH,
                Some(&token),
                json!({"new_password": "password2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(json_request(
                "POST",
                LOGIN_PATH,
                None,
                json!({"email": "a@b.com", "password": "password2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_sqlite_backed_router() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::open(temp_dir.path().join("vault.db"))
            .await
            .unwrap();
        let app = router(Arc::new(AppState::with_sqlite(store, authority())));
        let token = register_token(&app).await;

        let card = json!({
            "number": "MTIz",
            "period": "MTIz",
            "cvv": "MTIz",
            "full_name": "MTIz",
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/v1/cards/visa", Some(&token), card.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/v1/cards/visa", Some(&token), card.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Same meta key in another category is a different record.
        let response = app
            .clone()
            .oneshot(json_request("POST", "/v1/texts/visa", Some(&token), json!({"body": "MTIz"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(empty_request("GET", "/v1/cards/visa", Some(&token)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, card);
    }
}
