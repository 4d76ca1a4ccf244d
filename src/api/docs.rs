//! Document API endpoints
//!
//! - POST   /api/docs        - Upload a document (multipart: meta, json, file)
//! - GET    /api/docs        - List documents of the caller or of `?login=`
//! - GET    /api/docs/{id}   - Fetch a document; file documents are streamed back
//! - DELETE /api/docs/{id}   - Delete a document
//!
//! Reads go through the document cache; every write clears it.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::{header, HeaderValue},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::middleware::{
    method_not_allowed, require_auth, ApiError, AppState, AuthenticatedUser,
};
use crate::api::responses::ApiResponse;
use crate::cache::{doc_key, list_key, CachedDocs};
use crate::models::{CreateDocumentInput, Document};
use crate::services::DocsError;

/// Page size used when `limit` is absent or not a number
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// `meta` part of an upload
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DocumentMeta {
    pub name: String,
    pub file: bool,
    pub public: bool,
    pub mime: String,
    pub grants: Vec<String>,
}

/// Query parameters for listing documents
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// List documents of this user instead of the caller
    pub login: Option<String>,
    /// Raw limit, parsed leniently
    pub limit: Option<String>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIST_LIMIT)
    }
}

/// Build the document router. Every route requires a session.
pub fn router(state: AppState) -> Router<AppState> {
    let auth = axum_middleware::from_fn_with_state(state, require_auth);

    Router::new()
        .route(
            "/docs",
            get(list)
                .post(upload)
                .route_layer(auth.clone())
                .fallback(method_not_allowed),
        )
        .route(
            "/docs/{id}",
            get(get_document)
                .delete(delete_document)
                .route_layer(auth)
                .fallback(method_not_allowed),
        )
}

/// Final path component of a client supplied filename
fn file_component(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

fn docs_error(err: DocsError) -> ApiError {
    match err {
        DocsError::NotFound => ApiError::not_found(err.to_string()),
        DocsError::Internal(e) => {
            tracing::error!("Document operation failed: {:#}", e);
            ApiError::internal_error(format!("{:#}", e))
        }
    }
}

fn invalid_form(e: impl std::fmt::Display) -> ApiError {
    tracing::debug!("Rejected multipart form: {}", e);
    ApiError::validation_error("invalid multipart form")
}

/// Parts of an upload form we care about
#[derive(Default)]
struct UploadForm {
    meta: Option<String>,
    json: Option<String>,
    file: Option<(String, Bytes)>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "meta" => form.meta = Some(field.text().await.map_err(invalid_form)?),
            "json" => form.json = Some(field.text().await.map_err(invalid_form)?),
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(invalid_form)?;
                form.file = Some((filename, data));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/docs - Upload a document
async fn upload(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse, ApiError> {
    let form = read_form(multipart.map_err(invalid_form)?).await?;

    let mut meta: DocumentMeta = form
        .meta
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .ok_or_else(|| ApiError::validation_error("invalid meta json"))?;

    let json_data = match form.json.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            serde_json::from_str::<Value>(raw)
                .map_err(|_| ApiError::validation_error("invalid json field"))?,
        ),
    };

    if meta.file {
        let (filename, data) = form
            .file
            .as_ref()
            .and_then(|(raw, data)| file_component(raw).map(|name| (name, data)))
            .ok_or_else(|| ApiError::validation_error("file not found in form"))?;

        let dir = &state.upload_config.path;
        let target = dir.join(filename);
        let saved = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&target, data).await
        }
        .await;
        if let Err(e) = saved {
            tracing::error!("Failed to save upload {}: {}", target.display(), e);
            return Err(ApiError::internal_error("cannot save file"));
        }

        if meta.name.is_empty() {
            meta.name = filename.to_string();
        }
    }

    let doc = state
        .docs_service
        .create(CreateDocumentInput {
            name: meta.name,
            mime: meta.mime,
            file: meta.file,
            public: meta.public,
            owner: caller.user.id,
            grants: meta.grants,
            json_data,
        })
        .await
        .map_err(docs_error)?;

    state.cache.invalidate_all();

    Ok(ApiResponse::data(json!({
        "id": doc.id,
        "file": doc.name,
        "json": doc.json_data,
    })))
}

/// GET /api/docs - List documents
async fn list(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse, ApiError> {
    let owner = match query.login.as_deref().filter(|l| !l.is_empty()) {
        None => caller.user.id,
        Some(login) => match state.auth_service.get_user_by_login(login).await {
            Ok(Some(user)) => user.id,
            Ok(None) => return Err(ApiError::validation_error("unknown login")),
            Err(e) => {
                tracing::error!("Failed to resolve login {}: {}", login, e);
                return Err(ApiError::internal_error(e.to_string()));
            }
        },
    };
    let limit = query.limit();
    let key = list_key(&owner, limit);

    if let Some(CachedDocs::List(docs)) = state.cache.get(&key).await {
        tracing::debug!("Cache hit: {}", key);
        return Ok(ApiResponse::data(json!({ "docs": &*docs })));
    }

    let docs = Arc::new(
        state
            .docs_service
            .list(&owner, limit)
            .await
            .map_err(docs_error)?,
    );
    state.cache.set(key, CachedDocs::List(docs.clone())).await;

    Ok(ApiResponse::data(json!({ "docs": &*docs })))
}

/// Cached lookup falling back to the service
async fn load_document(state: &AppState, id: &str) -> Result<Arc<Document>, ApiError> {
    let key = doc_key(id);
    if let Some(CachedDocs::Document(doc)) = state.cache.get(&key).await {
        tracing::debug!("Cache hit: {}", key);
        return Ok(doc);
    }

    let doc = Arc::new(state.docs_service.get_by_id(id).await.map_err(docs_error)?);
    state.cache.set(key, CachedDocs::Document(doc.clone())).await;
    Ok(doc)
}

/// GET /api/docs/{id} - Fetch a document
async fn get_document(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = load_document(&state, &id).await?;

    if !doc.file {
        return Ok(ApiResponse::data(doc.json_data.clone().unwrap_or(Value::Null)).into_response());
    }

    let name = file_component(&doc.name).ok_or_else(|| ApiError::not_found("file not found"))?;
    let path = state.upload_config.path.join(name);
    let data = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!("Document {} file unavailable at {}: {}", doc.id, path.display(), e);
        ApiError::not_found("file not found")
    })?;

    let content_type = HeaderValue::from_str(&doc.mime)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// DELETE /api/docs/{id} - Delete a document
async fn delete_document(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    state.docs_service.delete(&id).await.map_err(docs_error)?;

    state.cache.invalidate(&doc_key(&id)).await;
    state.cache.invalidate_all();

    let mut body = serde_json::Map::new();
    body.insert(id, true.into());
    Ok(ApiResponse::response(body.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>) -> ListQuery {
        ListQuery {
            login: None,
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_limit_parsing() {
        assert_eq!(query(None).limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(query(Some("5")).limit(), 5);
        assert_eq!(query(Some("0")).limit(), 0);
        assert_eq!(query(Some("-1")).limit(), -1);
        assert_eq!(query(Some("ten")).limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(query(Some("")).limit(), DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_file_component_strips_directories() {
        assert_eq!(file_component("report.pdf"), Some("report.pdf"));
        assert_eq!(file_component("a/b/report.pdf"), Some("report.pdf"));
        assert_eq!(file_component("..\\..\\boot.ini"), Some("boot.ini"));
        assert_eq!(file_component("../"), None);
        assert_eq!(file_component(".."), None);
        assert_eq!(file_component(""), None);
    }

    #[test]
    fn test_meta_defaults() {
        let meta: DocumentMeta = serde_json::from_str(r#"{"name":"a.txt"}"#).unwrap();
        assert_eq!(meta.name, "a.txt");
        assert!(!meta.file);
        assert!(meta.grants.is_empty());

        assert!(serde_json::from_str::<DocumentMeta>("not json").is_err());
    }
}
