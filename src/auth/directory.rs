//! Contract for the persistent identity store.
//!
//! The core consumes this trait; the store itself is an external
//! collaborator (`store::PgDirectory` in production, `store::MemoryDirectory`
//! in tests). All lookups are exact-match and case-sensitive.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// One registered identity. Fields are immutable after creation; there are
/// no rename, re-email or delete operations.
#[derive(Clone, Debug)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Payload for creating an identity; the id is assigned by the store.
#[derive(Clone, Debug)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Username or email already present.
    #[error("username or email already exists")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Persist a new identity, failing with [`DirectoryError::Duplicate`]
    /// when username or email is already taken.
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, DirectoryError>;

    async fn find_by_username(&self, username: &str)
        -> Result<Option<Identity>, DirectoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError>;
}
