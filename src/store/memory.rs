//! In-process identity store with the same uniqueness semantics as the
//! Postgres store. Used by unit and integration tests.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::directory::{DirectoryError, Identity, NewIdentity, UserDirectory};

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    identities: Mutex<Vec<Identity>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, DirectoryError> {
        let mut identities = self.identities.lock().await;
        let taken = identities
            .iter()
            .any(|existing| {
                existing.username == identity.username || existing.email == identity.email
            });
        if taken {
            return Err(DirectoryError::Duplicate);
        }
        let created = Identity {
            id: Uuid::new_v4(),
            username: identity.username,
            email: identity.email,
            password_hash: identity.password_hash,
        };
        identities.push(created.clone());
        Ok(created)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, DirectoryError> {
        let identities = self.identities.lock().await;
        Ok(identities
            .iter()
            .find(|identity| identity.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError> {
        let identities = self.identities.lock().await;
        Ok(identities
            .iter()
            .find(|identity| identity.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError> {
        let identities = self.identities.lock().await;
        Ok(identities.iter().find(|identity| identity.id == id).cloned())
    }
}
