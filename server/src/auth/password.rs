//! Credential hashing and verification.
//!
//! The session protocol never stores or compares clear passwords; it goes
//! through the `CredentialScheme` capability, so the hashing algorithm is
//! swappable without touching the protocol. The default scheme is Argon2
//! with a random per-password salt, producing PHC strings.

use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use password_hash::{PasswordHash, SaltString};

/// Error returned when hashing a credential fails.
#[derive(Debug)]
pub enum PasswordError {
    /// Gathering salt material failed.
    Salt(String),
    /// The hash computation itself failed.
    Hash(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Salt(reason) => write!(f, "failed to generate salt: {reason}"),
            Self::Hash(reason) => write!(f, "failed to hash password: {reason}"),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Pluggable credential verification capability.
///
/// `hash` runs at registration; `verify` runs at login. Implementations
/// must never require the clear password to be retained after the call.
pub trait CredentialScheme: Send + Sync {
    /// Hash a clear password into a storable string.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError` if salt generation or hashing fails.
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Check a clear password against a stored hash.
    ///
    /// Unparseable hashes verify as false rather than erroring; a corrupt
    /// record must never let a login through.
    fn verify(&self, hash: &str, password: &str) -> bool;
}

/// Argon2 credential scheme with random 16-byte salts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Scheme;

impl CredentialScheme for Argon2Scheme {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordError::Salt(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Salt(e.to_string()))?;

        let argon2 = Argon2::default();
        let phc = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    fn verify(&self, hash: &str, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let scheme = Argon2Scheme;
        let phc = scheme.hash("correct horse battery staple").expect("hashes");
        assert!(scheme.verify(&phc, "correct horse battery staple"));
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let scheme = Argon2Scheme;
        let phc = scheme.hash("pw1").expect("hashes");
        assert!(!scheme.verify(&phc, "pw2"));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let scheme = Argon2Scheme;
        assert!(!scheme.verify("not-a-phc-string", "pw1"));
        assert!(!scheme.verify("", "pw1"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let scheme = Argon2Scheme;
        let first = scheme.hash("pw1").expect("hashes");
        let second = scheme.hash("pw1").expect("hashes");
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_never_contains_password() {
        let scheme = Argon2Scheme;
        let phc = scheme.hash("pw1-secret-value").expect("hashes");
        assert!(!phc.contains("pw1-secret-value"));
    }
}
