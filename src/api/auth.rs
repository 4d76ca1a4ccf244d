//! Authentication API endpoints
//!
//! - POST   /api/register       - Register a user (requires the admin token)
//! - POST   /api/auth           - Log in, returns a session token
//! - DELETE /api/auth/{token}   - Log out

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{delete, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::middleware::{method_not_allowed, ApiError, AppState};
use crate::api::responses::ApiResponse;
use crate::services::AuthError;

/// Request body for user registration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    /// Admin token authorizing the registration
    pub token: String,
    pub login: String,
    pub pswd: String,
}

/// Request body for login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthRequest {
    pub login: String,
    pub pswd: String,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register).fallback(method_not_allowed))
        .route("/auth", post(auth).fallback(method_not_allowed))
        .route("/auth/{token}", delete(logout).fallback(method_not_allowed))
}

/// Decode a JSON body regardless of the declared content type
fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::validation_error("invalid request body"))
}

/// POST /api/register - Register a new user
async fn register(State(state): State<AppState>, body: Bytes) -> Result<ApiResponse, ApiError> {
    let req: RegisterRequest = parse_body(&body)?;

    let user = state
        .auth_service
        .register(&req.login, &req.pswd, &req.token)
        .await
        .map_err(|e| match e {
            AuthError::PermissionDenied(msg) => ApiError::forbidden(msg),
            AuthError::Validation(msg) => ApiError::validation_error(msg),
            AuthError::NotFound(msg) => ApiError::not_found(msg),
            AuthError::Unauthorized(msg) => ApiError::unauthorized(msg),
            AuthError::Internal(e) => {
                tracing::error!("Registration failed: {:#}", e);
                ApiError::internal_error(format!("{:#}", e))
            }
        })?;

    Ok(ApiResponse::response(json!({ "login": user.login })))
}

/// POST /api/auth - Log in and open a session
async fn auth(State(state): State<AppState>, body: Bytes) -> Result<ApiResponse, ApiError> {
    let req: AuthRequest = parse_body(&body)?;

    let user = state
        .auth_service
        .authenticate(&req.login, &req.pswd)
        .await
        .map_err(|e| match e {
            AuthError::Internal(e) => {
                tracing::error!("Authentication failed: {:#}", e);
                ApiError::internal_error(format!("{:#}", e))
            }
            other => ApiError::unauthorized(other.to_string()),
        })?;

    let token = state.sessions.create(&user.id, &user.login).await;
    Ok(ApiResponse::response(json!({ "token": token })))
}

/// DELETE /api/auth/{token} - Close a session
async fn logout(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<ApiResponse, ApiError> {
    if !state.sessions.delete(&token).await {
        return Err(ApiError::validation_error("invalid token"));
    }

    tracing::info!("Session closed");
    let mut body = serde_json::Map::new();
    body.insert(token, true.into());
    Ok(ApiResponse::response(body.into()))
}
