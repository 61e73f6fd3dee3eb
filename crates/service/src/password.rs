use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::errors::IdentityError;

/// One-way hashing and verification of credentials with per-record salt.
///
/// The digest is a PHC-format Argon2id string; the salt is additionally
/// returned (and stored) on its own so verification never needs to parse
/// anything but the stored pair. The plaintext is never logged or returned.
pub struct PasswordVault;

impl PasswordVault {
    /// Hash `plaintext` under a fresh random salt; returns `(digest, salt)`.
    pub fn hash(plaintext: &str) -> Result<(String, String), IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| IdentityError::Transient(format!("password hashing failed: {e}")))?
            .to_string();
        Ok((digest, salt.to_string()))
    }

    /// Recompute the digest of `plaintext` under the stored `salt` and compare
    /// against `digest`. The hash-output comparison is constant time.
    ///
    /// Any malformed input (bad salt, undecodable digest) verifies as false
    /// rather than erroring; callers treat all failures as "wrong password".
    pub fn verify(digest: &str, plaintext: &str, salt: &str) -> bool {
        let Ok(salt) = SaltString::from_b64(salt) else {
            return false;
        };
        let Ok(candidate) = Argon2::default().hash_password(plaintext.as_bytes(), &salt) else {
            return false;
        };
        let Ok(stored) = PasswordHash::new(digest) else {
            return false;
        };
        match (stored.hash, candidate.hash) {
            // `Output` equality is constant-time.
            (Some(expected), Some(computed)) => expected == computed,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_accepts_the_original_plaintext() {
        let (digest, salt) = PasswordVault::hash("correct horse battery staple").unwrap();
        assert!(PasswordVault::verify(&digest, "correct horse battery staple", &salt));
    }

    #[test]
    fn verify_rejects_any_other_plaintext() {
        let (digest, salt) = PasswordVault::hash("secret").unwrap();
        assert!(!PasswordVault::verify(&digest, "Secret", &salt));
        assert!(!PasswordVault::verify(&digest, "", &salt));
    }

    #[test]
    fn each_hash_gets_a_fresh_salt_and_digest() {
        let (digest_a, salt_a) = PasswordVault::hash("secret").unwrap();
        let (digest_b, salt_b) = PasswordVault::hash("secret").unwrap();
        assert_ne!(salt_a, salt_b);
        assert_ne!(digest_a, digest_b);
    }

    #[test]
    fn malformed_inputs_verify_as_false() {
        let (digest, _) = PasswordVault::hash("secret").unwrap();
        assert!(!PasswordVault::verify(&digest, "secret", "not base64!!"));
        assert!(!PasswordVault::verify("not-a-phc-string", "secret", "c29tZXNhbHQ"));
    }
}
