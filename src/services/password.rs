//! Password hashing
//!
//! Argon2id with the crate's default parameters and a random salt per hash.
//! Hashes are stored in PHC string format, so parameters travel with them.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("Password verification failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_uses_argon2id_and_random_salt() {
        let first = hash_password("Passw0rd!").expect("Failed to hash password");
        let second = hash_password("Passw0rd!").expect("Failed to hash password");

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("Passw0rd!").expect("Failed to hash password");

        assert!(verify_password("Passw0rd!", &hash).unwrap());
        assert!(!verify_password("passw0rd!", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("Passw0rd!", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_unicode_password() {
        let hash = hash_password("Пароль1!Ab").expect("Failed to hash password");
        assert!(verify_password("Пароль1!Ab", &hash).unwrap());
    }
}
