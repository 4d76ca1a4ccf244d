//! User model
//!
//! Registered users own documents. Logins are unique and the password is
//! only ever held as an Argon2 hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Login (unique, latin letters and digits)
    pub login: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with a freshly generated ID.
    ///
    /// Note: The password should already be hashed before calling this function.
    /// Use `services::password::hash_password()` to hash the password.
    pub fn new(login: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            login,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
