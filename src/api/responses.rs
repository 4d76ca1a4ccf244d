//! Response envelope
//!
//! Every JSON body has the shape `{error?, response?, data?}` with absent
//! members omitted. Errors are produced by `ApiError`; successful handlers
//! return `ApiResponse`, which never carries `error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Envelope carrying an action result in `response`
    pub fn response(value: Value) -> Self {
        Self {
            response: Some(value),
            ..Default::default()
        }
    }

    /// Envelope carrying a payload in `data`; `Value::Null` is kept as `null`
    pub fn data(value: Value) -> Self {
        Self {
            data: Some(value),
            ..Default::default()
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
