//! Implementations of the [`UserDirectory`](crate::auth::UserDirectory)
//! contract: Postgres for production, in-memory for tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;
