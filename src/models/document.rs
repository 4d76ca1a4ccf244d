//! Document model
//!
//! A document is either a stored file (`file == true`, bytes live in the
//! upload directory under the document name) or an embedded JSON payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document entity as persisted and cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Display name, also the on-disk name for file documents
    pub name: String,
    /// MIME type reported when the file is served
    pub mime: String,
    /// Whether the document is backed by an uploaded file
    pub file: bool,
    /// Public flag (informational)
    pub public: bool,
    /// Owning user ID
    pub owner: String,
    /// Creation timestamp
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    /// Access grants (informational)
    #[serde(default)]
    pub grants: Vec<String>,
    /// Embedded JSON payload
    #[serde(rename = "json", default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<serde_json::Value>,
}

/// Input for creating a document; ID and timestamp are assigned by the service
#[derive(Debug, Clone, Default)]
pub struct CreateDocumentInput {
    pub name: String,
    pub mime: String,
    pub file: bool,
    pub public: bool,
    pub owner: String,
    pub grants: Vec<String>,
    pub json_data: Option<serde_json::Value>,
}

impl Document {
    /// Build a document from input, assigning a fresh ID and the current time
    pub fn new(input: CreateDocumentInput) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            mime: input.mime,
            file: input.file,
            public: input.public,
            owner: input.owner,
            created_at: Utc::now(),
            grants: input.grants,
            json_data: input.json_data,
        }
    }
}
