//! API middleware
//!
//! Contains:
//! - `AppState`, the shared handles every handler receives
//! - `ApiError`, the error half of the response envelope
//! - Session token resolution and the `require_auth` middleware

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, FromRequestParts, Multipart, Query, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::DocumentCache;
use crate::config::UploadConfig;
use crate::models::{Session, User};
use crate::services::{AuthService, DocsService, SessionStore};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub docs_service: Arc<DocsService>,
    pub sessions: Arc<SessionStore>,
    pub cache: Arc<DocumentCache>,
    pub upload_config: Arc<UploadConfig>,
}

/// Caller identity resolved by `require_auth`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub session: Session,
    pub user: User,
}

/// Error response, rendered as `{"error": {"code": <status>, "text": ...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub text: String,
}

impl ApiError {
    pub fn new(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: status.as_u16(),
                text: text.into(),
            },
        }
    }

    pub fn validation_error(text: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, text)
    }

    pub fn unauthorized(text: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, text)
    }

    pub fn forbidden(text: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, text)
    }

    pub fn not_found(text: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, text)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    }

    pub fn internal_error(text: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, text)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Fallback for known paths hit with an unsupported method
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `token` query parameter
fn token_from_query(request: &Request) -> Option<String> {
    let Query(query) = Query::<TokenQuery>::try_from_uri(request.uri()).ok()?;
    non_empty(query.token)
}

/// `Authorization` header, raw or with a `Bearer ` prefix
fn token_from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    non_empty(Some(token.to_string()))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Find a `token` field in a buffered multipart body.
///
/// Parsing runs on a copy of the request so the original body can be handed
/// on to the handler untouched.
async fn token_from_multipart(parts: &Parts, body: Bytes) -> Option<String> {
    let mut form_request = axum::http::Request::new(Body::from(body));
    *form_request.headers_mut() = parts.headers.clone();
    *form_request.extensions_mut() = parts.extensions.clone();

    let mut multipart = Multipart::from_request(form_request, &()).await.ok()?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("token") {
            return non_empty(field.text().await.ok());
        }
    }
    None
}

/// Resolve the session token for a request.
///
/// Sources in priority order: `token` query parameter, `Authorization`
/// header, `token` multipart field. Returns the request (with its body
/// restored when it had to be buffered) alongside the token.
pub async fn extract_token(
    request: Request,
    body_limit: usize,
) -> Result<(Request, Option<String>), ApiError> {
    if let Some(token) = token_from_query(&request) {
        return Ok((request, Some(token)));
    }
    if let Some(token) = token_from_header(request.headers()) {
        return Ok((request, Some(token)));
    }
    if !is_multipart(request.headers()) {
        return Ok((request, None));
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, body_limit).await.map_err(|e| {
        tracing::debug!("Failed to buffer multipart body: {}", e);
        ApiError::validation_error("invalid multipart form")
    })?;

    let token = token_from_multipart(&parts, bytes.clone()).await;
    Ok((axum::http::Request::from_parts(parts, Body::from(bytes)), token))
}

/// Authentication middleware
///
/// Resolves the token to a session, re-reads the user record and stores an
/// `AuthenticatedUser` in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut request, token) = extract_token(request, state.upload_config.max_body_size).await?;
    let token = token.ok_or_else(|| ApiError::unauthorized("missing authentication token"))?;

    let session = state
        .sessions
        .get(&token)
        .await
        .ok_or_else(|| ApiError::unauthorized("invalid token"))?;

    let user = match state.auth_service.get_user(&session.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::unauthorized("user not found")),
        Err(e) => {
            tracing::error!("Failed to resolve session user {}: {}", session.user_id, e);
            return Err(ApiError::unauthorized("user not found"));
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { session, user });
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("missing authentication token"))
    }
}

// ============================================================================
// Tests
// ============================================================================
