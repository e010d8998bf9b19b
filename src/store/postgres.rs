//! Postgres-backed identity store over the `users` table (`sql/schema.sql`).

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::auth::directory::{DirectoryError, Identity, NewIdentity, UserDirectory};

#[derive(Clone, Debug)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_where(
        &self,
        query: &'static str,
        bind: &str,
    ) -> Result<Option<Identity>, DirectoryError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up identity")?;
        row.map(identity_from_row).transpose()
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, DirectoryError> {
        let query = r"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&identity.username)
            .bind(&identity.email)
            .bind(&identity.password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => identity_from_row(row),
            Err(err) if is_unique_violation(&err) => Err(DirectoryError::Duplicate),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert identity")
                .into()),
        }
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, DirectoryError> {
        self.find_where(
            "SELECT id, username, email, password_hash FROM users WHERE username = $1",
            username,
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError> {
        self.find_where(
            "SELECT id, username, email, password_hash FROM users WHERE email = $1",
            email,
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError> {
        let query = "SELECT id, username, email, password_hash FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up identity by id")?;
        row.map(identity_from_row).transpose()
    }
}

fn identity_from_row(row: PgRow) -> Result<Identity, DirectoryError> {
    Ok(Identity {
        id: row.try_get("id").context("missing id column")?,
        username: row.try_get("username").context("missing username column")?,
        email: row.try_get("email").context("missing email column")?,
        password_hash: row
            .try_get("password_hash")
            .context("missing password_hash column")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
