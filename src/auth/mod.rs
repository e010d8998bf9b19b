//! Authentication core: registration, credential verification and token
//! introspection, composed from the hasher, the token signer, the abuse
//! guard and the user directory.

use anyhow::anyhow;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub mod directory;
pub mod error;
pub mod guard;
pub mod hasher;
pub mod token;

pub use directory::{DirectoryError, Identity, NewIdentity, UserDirectory};
pub use error::AuthError;
pub use guard::{AbuseGuard, FixedWindowGuard, GuardDecision, NoopGuard};
pub use hasher::CredentialHasher;
pub use token::TokenSigner;

use regex::Regex;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_ATTEMPTS: u32 = 6;

/// Immutable core configuration, constructed once at startup and passed
/// explicitly; there is no ambient global state.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_ttl_seconds: i64,
    rate_limit_window_seconds: u64,
    rate_limit_max_attempts: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            rate_limit_window_seconds: DEFAULT_RATE_LIMIT_WINDOW_SECONDS,
            rate_limit_max_attempts: DEFAULT_RATE_LIMIT_MAX_ATTEMPTS,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_rate_limit_window_seconds(mut self, seconds: u64) -> Self {
        self.rate_limit_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_rate_limit_max_attempts(mut self, attempts: u32) -> Self {
        self.rate_limit_max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn rate_limit_window_seconds(&self) -> u64 {
        self.rate_limit_window_seconds
    }

    #[must_use]
    pub fn rate_limit_max_attempts(&self) -> u32 {
        self.rate_limit_max_attempts
    }
}

/// Successful registration result.
#[derive(Clone, Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Credential verification outcome. An unknown identity or a wrong password
/// is a normal negative result, not an error.
#[derive(Clone, Debug)]
pub enum Login {
    Valid { token: String },
    Invalid,
}

/// What a valid token resolves to. Never carries the password hash.
#[derive(Clone, Debug)]
pub struct Profile {
    pub username: String,
    pub email: String,
}

pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    hasher: CredentialHasher,
    signer: TokenSigner,
    guard: Arc<dyn AbuseGuard>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        hasher: CredentialHasher,
        signer: TokenSigner,
        guard: Arc<dyn AbuseGuard>,
    ) -> Self {
        Self {
            directory,
            hasher,
            signer,
            guard,
        }
    }

    /// Register a new identity and issue its first token.
    ///
    /// # Errors
    /// `Validation` for malformed input, `Duplicate` when username or email
    /// is taken, `Hashing`/`Store` for infrastructure failures.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        let fields = register_field_errors(username, email, password);
        if !fields.is_empty() {
            return Err(AuthError::validation(fields));
        }

        let password_hash = self.hash_blocking(password.to_string()).await?;

        let identity = self
            .directory
            .insert(NewIdentity {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        debug!(id = %identity.id, "identity created");

        let token = self.signer.issue(identity.id)?;
        Ok(Registration {
            username: identity.username,
            email: identity.email,
            token,
        })
    }

    /// Verify credentials for `username_or_email`, rate limited per
    /// `client_key` (the client network address).
    ///
    /// Dispatch is purely syntactic: any input containing `@` is looked up
    /// as an email, even a username that happens to contain one.
    ///
    /// # Errors
    /// `RateLimited` once the client exceeds the ceiling (checked before any
    /// directory lookup), `Validation` for missing fields,
    /// `Hashing`/`Store` for infrastructure failures.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
        client_key: &str,
    ) -> Result<Login, AuthError> {
        if self.guard.check_and_count(client_key) == GuardDecision::Limited {
            warn!(client_key, "login rate limited");
            return Err(AuthError::RateLimited);
        }

        let fields = login_field_errors(username_or_email, password);
        if !fields.is_empty() {
            return Err(AuthError::validation(fields));
        }

        let identity = if username_or_email.contains('@') {
            self.directory.find_by_email(username_or_email).await?
        } else {
            self.directory.find_by_username(username_or_email).await?
        };

        let Some(identity) = identity else {
            return Ok(Login::Invalid);
        };

        let matched = self
            .verify_blocking(password.to_string(), identity.password_hash.clone())
            .await?;
        if !matched {
            return Ok(Login::Invalid);
        }

        let token = self.signer.issue(identity.id)?;
        Ok(Login::Valid { token })
    }

    /// Resolve a token into the identity it asserts.
    ///
    /// # Errors
    /// `Unauthenticated` for an invalid token and for a subject that no
    /// longer resolves; the two are indistinguishable to the caller.
    #[instrument(skip(self, token))]
    pub async fn whoami(&self, token: &str) -> Result<Profile, AuthError> {
        let subject = self.signer.validate(token)?;
        let identity = self
            .directory
            .find_by_id(subject)
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        Ok(Profile {
            username: identity.username,
            email: identity.email,
        })
    }

    /// Argon2 is deliberately slow; keep it off the async worker threads.
    async fn hash_blocking(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| AuthError::Hashing(anyhow!("hash task: {err}")))?
    }

    async fn verify_blocking(
        &self,
        password: String,
        digest: String,
    ) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|err| AuthError::Hashing(anyhow!("verify task: {err}")))?
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate => AuthError::Duplicate,
            DirectoryError::Other(err) => AuthError::Store(err),
        }
    }
}

/// Basic email format check: something before and after a single `@`, with
/// a dot in the domain part.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

fn register_field_errors(username: &str, email: &str, password: &str) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if username.trim().is_empty() {
        fields.push("username");
    }
    if !valid_email(email) {
        fields.push("email");
    }
    if password.is_empty() {
        fields.push("password");
    }
    fields
}

fn login_field_errors(username_or_email: &str, password: &str) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if username_or_email.is_empty() {
        fields.push("username");
    }
    if password.is_empty() {
        fields.push("password");
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDirectory;
    use anyhow::Result;
    use secrecy::SecretString;
    use std::time::Duration;

    fn service_with(guard: Arc<dyn AbuseGuard>) -> AuthService {
        let signer = TokenSigner::new(&SecretString::from("unit-secret".to_string()), 60);
        AuthService::new(
            Arc::new(MemoryDirectory::new()),
            CredentialHasher::new(),
            signer,
            guard,
        )
    }

    fn service() -> AuthService {
        service_with(Arc::new(NoopGuard))
    }

    #[tokio::test]
    async fn register_then_whoami_round_trips() -> Result<()> {
        let auth = service();
        let registration = auth.register("alice", "a@x.com", "pw123").await?;
        assert_eq!(registration.username, "alice");
        assert_eq!(registration.email, "a@x.com");

        let profile = auth.whoami(&registration.token).await?;
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.email, "a@x.com");
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_malformed_input() {
        let auth = service();
        let err = auth.register("", "not-an-email", "").await.unwrap_err();
        match err {
            AuthError::Validation { fields } => {
                assert_eq!(fields, vec!["username", "email", "password"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_surfaced() -> Result<()> {
        let auth = service();
        auth.register("alice", "a@x.com", "pw123").await?;
        let err = auth
            .register("alice", "b@y.com", "pw456")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Duplicate));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_surfaced() -> Result<()> {
        let auth = service();
        auth.register("alice", "a@x.com", "pw123").await?;
        let err = auth
            .register("bob", "a@x.com", "pw456")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Duplicate));
        Ok(())
    }

    #[tokio::test]
    async fn login_works_by_username_and_by_email() -> Result<()> {
        let auth = service();
        auth.register("alice", "a@x.com", "pw123").await?;

        let by_username = auth.login("alice", "pw123", "10.0.0.1").await?;
        assert!(matches!(by_username, Login::Valid { .. }));

        let by_email = auth.login("a@x.com", "pw123", "10.0.0.1").await?;
        let Login::Valid { token } = by_email else {
            panic!("expected a valid login by email");
        };
        let profile = auth.whoami(&token).await?;
        assert_eq!(profile.username, "alice");
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_invalid_not_errors() -> Result<()> {
        let auth = service();
        auth.register("alice", "a@x.com", "pw123").await?;

        assert!(matches!(
            auth.login("alice", "wrong", "10.0.0.1").await?,
            Login::Invalid
        ));
        assert!(matches!(
            auth.login("nobody", "pw123", "10.0.0.1").await?,
            Login::Invalid
        ));
        assert!(matches!(
            auth.login("nobody@x.com", "pw123", "10.0.0.1").await?,
            Login::Invalid
        ));
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_missing_fields() {
        let auth = service();
        let err = auth.login("", "", "10.0.0.1").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { .. }));
    }

    #[tokio::test]
    async fn login_is_rate_limited_before_any_lookup() -> Result<()> {
        let guard = Arc::new(FixedWindowGuard::new(Duration::from_secs(60), 2));
        let auth = service_with(guard);
        auth.register("alice", "a@x.com", "pw123").await?;

        assert!(matches!(
            auth.login("alice", "pw123", "10.0.0.9").await?,
            Login::Valid { .. }
        ));
        assert!(matches!(
            auth.login("alice", "pw123", "10.0.0.9").await?,
            Login::Valid { .. }
        ));
        // Third attempt from the same address is refused even though the
        // credentials are correct.
        let err = auth.login("alice", "pw123", "10.0.0.9").await.unwrap_err();
        assert!(matches!(err, AuthError::RateLimited));

        // A different client address is unaffected.
        assert!(matches!(
            auth.login("alice", "pw123", "10.0.0.10").await?,
            Login::Valid { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn register_and_whoami_are_not_rate_limited() -> Result<()> {
        let guard = Arc::new(FixedWindowGuard::new(Duration::from_secs(60), 1));
        let auth = service_with(guard);
        let first = auth.register("alice", "a@x.com", "pw123").await?;
        let second = auth.register("bob", "b@x.com", "pw456").await?;
        auth.whoami(&first.token).await?;
        auth.whoami(&second.token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn whoami_hides_missing_identity_behind_unauthenticated() -> Result<()> {
        let auth = service();
        let registration = auth.register("alice", "a@x.com", "pw123").await?;

        // Same signing secret, empty directory: the token verifies but its
        // subject resolves to nothing.
        let other = service();
        let err = other.whoami(&registration.token).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
        Ok(())
    }

    #[tokio::test]
    async fn whoami_rejects_garbage_tokens() {
        let auth = service();
        assert!(matches!(
            auth.whoami("garbage").await.unwrap_err(),
            AuthError::Unauthenticated
        ));
        assert!(matches!(
            auth.whoami("").await.unwrap_err(),
            AuthError::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn username_containing_at_sign_is_treated_as_email() -> Result<()> {
        let auth = service();
        auth.register("odd@name", "odd@real.com", "pw123").await?;
        // The `@` dispatch sends this to the email lookup, where it does not
        // exist; the documented quirk, not a bug.
        assert!(matches!(
            auth.login("odd@name", "pw123", "10.0.0.1").await?,
            Login::Invalid
        ));
        assert!(matches!(
            auth.login("odd@real.com", "pw123", "10.0.0.1").await?,
            Login::Valid { .. }
        ));
        Ok(())
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("no-dot@domain"));
    }

    #[test]
    fn config_defaults_match_the_verify_limits() {
        let config = AuthConfig::new();
        assert_eq!(config.rate_limit_window_seconds(), 60);
        assert_eq!(config.rate_limit_max_attempts(), 6);
        assert_eq!(config.token_ttl_seconds(), 24 * 60 * 60);
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = AuthConfig::new()
            .with_token_ttl_seconds(300)
            .with_rate_limit_window_seconds(10)
            .with_rate_limit_max_attempts(3);
        assert_eq!(config.token_ttl_seconds(), 300);
        assert_eq!(config.rate_limit_window_seconds(), 10);
        assert_eq!(config.rate_limit_max_attempts(), 3);
    }
}
