use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use std::fmt;
use std::sync::OnceLock;

use crate::{CoreError, CoreResult};

/// An Argon2 PHC string. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wraps a hash that was previously produced by [`hash_password`] and stored.
    pub fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks a plain-text candidate. A corrupt stored hash never verifies.
    pub fn verify(&self, candidate: &str) -> bool {
        let parsed = match PasswordHash::new(&self.0) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

pub fn hash_password(plain: &str) -> CoreResult<HashedPassword> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| HashedPassword(hash.to_string()))
        .map_err(|e| {
            tracing::error!(error = %e, "Argon2 password hashing failed");
            CoreError::Storage(format!("password hashing failed: {}", e))
        })
}

static PLACEHOLDER: OnceLock<Option<HashedPassword>> = OnceLock::new();

fn placeholder_hash() -> Option<&'static HashedPassword> {
    PLACEHOLDER
        .get_or_init(|| hash_password("tripbook-placeholder-credential").ok())
        .as_ref()
}

/// Runs one Argon2 verification against a hash no account owns.
///
/// Login paths that reject without a stored hash call this so they take as
/// long as a real password check.
pub fn verify_placeholder(candidate: &str) {
    if let Some(hash) = placeholder_hash() {
        let _ = hash.verify(candidate);
    }
}
