use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::AppError;

/// Stored credential. Holds only the Argon2 PHC string, never plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl Password {
    pub fn set(plain: &str) -> Result<Self, AppError> {
        hash_password(plain).map(|hash| Self { hash })
    }

    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn matches(&self, plain: &str) -> bool {
        verify_password(plain, &self.hash)
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(..)")
    }
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AppError::Hashing
        })?
        .to_string();
    Ok(hash)
}

/// Argon2 verification compares in constant time. A malformed stored hash is
/// logged and treated as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "argon2 parse hash error");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let stored = Password::set(password).expect("hashing should succeed");
        assert!(stored.matches(password));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let stored = Password::set("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!stored.matches("wrong-password"));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!Password::from_hash("not-a-valid-hash").matches("anything"));
    }

    #[test]
    fn hash_is_salted_and_not_plaintext() {
        let a = hash_password("pw123456").unwrap();
        let b = hash_password("pw123456").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("pw123456"));
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn debug_does_not_print_hash() {
        let stored = Password::set("pw123456").unwrap();
        assert_eq!(format!("{stored:?}"), "Password(..)");
    }
}
