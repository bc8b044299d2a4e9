//! Password hashing, verification, and format validation.
//!
//! Argon2id hashing in PHC string format. Verification parses the stored
//! hash, so parameter changes only affect newly created hashes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::AuthError;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Hashes a password with Argon2id and a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash string.
///
/// A malformed stored hash verifies as false rather than erroring; Argon2
/// compares in constant time internally.
pub fn verify_password(plaintext: &str, phc_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Validates username format: 3-32 characters, ASCII letters, digits,
/// underscore, or hyphen. Uniqueness is enforced elsewhere.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err("username must be at least 3 characters");
    }
    if len > MAX_USERNAME_LENGTH {
        return Err("username must be at most 32 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err("username may only contain letters, digits, underscore, or hyphen");
    }
    Ok(())
}

/// Validates password format: 8-128 characters with at least one letter
/// and one digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err("password must be at least 8 characters");
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err("password must be at most 128 characters");
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password must contain at least one digit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Str0ngPass!").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("Str0ngPass!", &hash));
        assert!(!verify_password("WrongPass1", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Str0ngPass!").unwrap();
        let b = hash_password("Str0ngPass!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(!verify_password("Str0ngPass!", "not-a-phc-string"));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a_b-c123").is_ok());

        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("alice!").is_err());
        assert!(validate_username("al ice").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Str0ngPass!").is_ok());

        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password(&format!("a1{}", "x".repeat(127))).is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
    }
}
