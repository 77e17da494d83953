//! Record storage: in-memory repositories and the PostgreSQL adapters.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;
#[cfg(feature = "postgres")]
mod schema;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
pub use memory::{InMemoryAccountRepository, InMemoryPostRepository};

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresAccountRepository, PostgresPostRepository};
#[cfg(feature = "postgres")]
pub use schema::ensure_schema;
