//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated session, addressed by its bearer token.
///
/// Sessions never expire on their own; they live until logout or restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token (UUID v4)
    pub token: String,
    /// Owning user ID
    pub user_id: String,
    /// Login of the owning user at the time the session was created
    pub login: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
