use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::error::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::internal_with_source("password hashing failed", err))
}

/// A stored hash that does not parse counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_round_trips_and_rejects_other_passwords() {
        let hash = hash_password("Passw0rd").expect("hash should succeed");
        assert_ne!(hash, "Passw0rd");
        assert!(verify_password("Passw0rd", &hash));
        assert!(!verify_password("passw0rd", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("Passw0rd", "not-a-phc-string"));
    }
}
