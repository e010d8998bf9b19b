//! One-way password hashing and constant-time verification.
//!
//! Argon2id with a fresh salt per hash; the work factor is the deliberate
//! cost gate against offline brute force. Verification goes through the
//! `password_hash` comparison API, which does not leak how many leading
//! bytes of the digest match.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};

use crate::auth::error::AuthError;

#[derive(Clone, Default)]
pub struct CredentialHasher {
    params: Argon2<'static>,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

impl CredentialHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a salted PHC-string digest of `plaintext`.
    ///
    /// # Errors
    /// Returns `AuthError::Hashing` only on resource-level failure; never on
    /// any property of the input.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .params
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| AuthError::Hashing(anyhow!("hash_password: {err}")))?;
        Ok(digest.to_string())
    }

    /// Recompute and compare `plaintext` against a stored digest.
    ///
    /// A well-formed digest that does not match returns `Ok(false)`.
    ///
    /// # Errors
    /// Returns `AuthError::Hashing` when the digest itself is malformed.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|err| AuthError::Hashing(anyhow!("malformed digest: {err}")))?;
        match self.params.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::Hashing(anyhow!("verify_password: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() -> Result<(), AuthError> {
        let hasher = CredentialHasher::new();
        let digest = hasher.hash("pw123")?;
        assert!(hasher.verify("pw123", &digest)?);
        Ok(())
    }

    #[test]
    fn wrong_password_is_false_not_error() -> Result<(), AuthError> {
        let hasher = CredentialHasher::new();
        let digest = hasher.hash("pw123")?;
        assert!(!hasher.verify("wrong", &digest)?);
        Ok(())
    }

    #[test]
    fn each_hash_gets_a_fresh_salt() -> Result<(), AuthError> {
        let hasher = CredentialHasher::new();
        let first = hasher.hash("pw123")?;
        let second = hasher.hash("pw123")?;
        assert_ne!(first, second);
        assert!(hasher.verify("pw123", &first)?);
        assert!(hasher.verify("pw123", &second)?);
        Ok(())
    }

    #[test]
    fn malformed_digest_is_a_hashing_error() {
        let hasher = CredentialHasher::new();
        let result = hasher.verify("pw123", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }

    #[test]
    fn digest_never_contains_the_plaintext() -> Result<(), AuthError> {
        let hasher = CredentialHasher::new();
        let digest = hasher.hash("hunter2-secret")?;
        assert!(!digest.contains("hunter2-secret"));
        assert!(digest.starts_with("$argon2id$"));
        Ok(())
    }
}
