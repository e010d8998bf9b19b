//! Error taxonomy for the authentication core.
//!
//! Every operation surfaces one of these variants so callers can match
//! exhaustively instead of inspecting response shapes. Stored secrets never
//! appear in any variant's display output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input; lists the offending fields.
    #[error("invalid fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    /// Username or email already registered.
    #[error("username or email already taken")]
    Duplicate,

    /// Too many verification attempts from the same client.
    #[error("too many attempts, retry after the window expires")]
    RateLimited,

    /// Password hashing or verification infrastructure failure. Not retried:
    /// repeated hashing failures point at a resource problem, not bad input.
    #[error("password hashing failed")]
    Hashing(#[source] anyhow::Error),

    /// Missing, malformed or unverifiable token, or a subject that no longer
    /// resolves to an identity. The two cases are deliberately the same
    /// variant so the distinction does not leak to clients.
    #[error("authentication required")]
    Unauthenticated,

    /// Unexpected store or infrastructure failure; logged for operators,
    /// generic to clients.
    #[error("identity store failure")]
    Store(#[source] anyhow::Error),
}

impl AuthError {
    pub(crate) fn validation<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}
