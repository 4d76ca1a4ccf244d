//! Auth service
//!
//! Registration behind the admin token and login/password authentication.
//! Sessions themselves live in `SessionStore`; this service only decides
//! who the caller is.

use crate::db::repositories::UserRepository;
use crate::models::User;
use crate::services::password::{hash_password, verify_password};
use crate::services::validation::{validate_login, validate_password};
use anyhow::Context;
use std::sync::Arc;

/// Error types for auth service operations
///
/// Display text is the client-facing message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Admin token mismatch on registration
    #[error("{0}")]
    PermissionDenied(String),

    /// Login or password format rejected
    #[error("{0}")]
    Validation(String),

    /// No user with that login
    #[error("{0}")]
    NotFound(String),

    /// Credentials did not verify
    #[error("{0}")]
    Unauthorized(String),

    /// Repository or hashing failure
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Auth service for registration and authentication
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    admin_token: String,
}

impl AuthService {
    /// Create a new auth service checking registrations against `admin_token`
    pub fn new(user_repo: Arc<dyn UserRepository>, admin_token: impl Into<String>) -> Self {
        Self {
            user_repo,
            admin_token: admin_token.into(),
        }
    }

    /// Register a new user.
    ///
    /// Checks run in order: admin token, login format, password strength.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` if `admin_token` does not match
    /// - `Validation` with the first violated format rule, or when the login is taken
    /// - `Internal` for hashing or database errors
    pub async fn register(
        &self,
        login: &str,
        password: &str,
        admin_token: &str,
    ) -> Result<User, AuthError> {
        if admin_token != self.admin_token {
            tracing::warn!("Registration rejected: invalid admin token");
            return Err(AuthError::PermissionDenied("invalid admin token".to_string()));
        }
        validate_login(login).map_err(|msg| AuthError::Validation(msg.to_string()))?;
        validate_password(password).map_err(|msg| AuthError::Validation(msg.to_string()))?;

        let taken = self
            .user_repo
            .get_by_login(login)
            .await
            .context("Failed to look up user")?;
        if taken.is_some() {
            return Err(AuthError::Validation("login already exists".to_string()));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let user = User::new(login.to_string(), password_hash);

        let user = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!("User registered: {}", user.login);
        Ok(user)
    }

    /// Authenticate by login and password, returning the stored user.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no user has that login
    /// - `Unauthorized` if the password does not verify
    /// - `Internal` for database errors
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .user_repo
            .get_by_login(login)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| AuthError::NotFound("user not found".to_string()))?;

        let verified = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
            tracing::warn!("Stored hash for {} failed to parse: {:#}", user.login, e);
            false
        });
        if !verified {
            return Err(AuthError::Unauthorized("invalid password".to_string()));
        }

        tracing::info!("User authenticated: {}", user.login);
        Ok(user)
    }

    /// Resolve a user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AuthError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to look up user")?;
        Ok(user)
    }

    /// Resolve a user by login
    pub async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, AuthError> {
        let user = self
            .user_repo
            .get_by_login(login)
            .await
            .context("Failed to look up user")?;
        Ok(user)
    }
}
