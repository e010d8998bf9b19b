//! Stateless bearer token issuance and validation.
//!
//! Tokens are HS256 JWTs whose subject is the identity id, signed with a
//! process-wide secret. Validity is a pure function of (payload, secret,
//! clock): no server-side record is kept and nothing is revocable. Tokens
//! carry an explicit expiry so trust is time-bounded.

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
    jti: Uuid,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            ttl_seconds,
        }
    }

    /// Issue a signed token bound to `subject`.
    ///
    /// # Errors
    /// Returns `AuthError::Store` when signing fails; an infrastructure
    /// condition, not a property of the subject.
    pub fn issue(&self, subject: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject,
            iat: now,
            exp: now + self.ttl_seconds,
            jti: Uuid::new_v4(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Store(anyhow!("token signing: {err}")))
    }

    /// Verify signature and expiry, returning the embedded subject.
    ///
    /// # Errors
    /// Returns `AuthError::Unauthenticated` on signature mismatch, malformed
    /// structure, or expiry.
    pub fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::Unauthenticated)?;
        Ok(data.claims.sub)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys stay out of debug output.
        f.debug_struct("TokenSigner")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(ttl_seconds: i64) -> TokenSigner {
        TokenSigner::new(&SecretString::from("test-secret".to_string()), ttl_seconds)
    }

    #[test]
    fn issue_then_validate_returns_subject() -> Result<(), AuthError> {
        let signer = signer(60);
        let subject = Uuid::new_v4();
        let token = signer.issue(subject)?;
        assert_eq!(signer.validate(&token)?, subject);
        Ok(())
    }

    #[test]
    fn tampered_token_is_rejected() -> Result<(), AuthError> {
        let signer = signer(60);
        let token = signer.issue(Uuid::new_v4())?;
        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).map_err(|_| AuthError::Unauthenticated)?;
        assert!(matches!(
            signer.validate(&tampered),
            Err(AuthError::Unauthenticated)
        ));
        Ok(())
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() -> Result<(), AuthError> {
        let ours = signer(60);
        let theirs = TokenSigner::new(&SecretString::from("other-secret".to_string()), 60);
        let token = theirs.issue(Uuid::new_v4())?;
        assert!(matches!(
            ours.validate(&token),
            Err(AuthError::Unauthenticated)
        ));
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<(), AuthError> {
        let signer = signer(-120);
        let token = signer.issue(Uuid::new_v4())?;
        assert!(matches!(
            signer.validate(&token),
            Err(AuthError::Unauthenticated)
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() {
        let signer = signer(60);
        assert!(matches!(
            signer.validate("not.a.token"),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(signer.validate(""), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn debug_output_hides_keys() {
        let signer = signer(60);
        let debug = format!("{signer:?}");
        assert!(!debug.contains("test-secret"));
    }
}
