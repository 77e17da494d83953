//! # Vertigo Infrastructure
//!
//! Concrete implementations of the ports defined in `vertigo-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory adapters only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - Argon2 password hashing
//! - `redis` - Redis-backed session store
//! - `mailgun` - Recovery mail delivery through the Mailgun HTTP API

pub mod database;
pub mod jobs;
pub mod notify;
pub mod sanitize;
pub mod session;
pub mod settings;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, InMemoryAccountRepository, InMemoryPostRepository};
pub use jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};
pub use notify::LogDispatcher;
pub use sanitize::HtmlSanitizer;
pub use session::{InMemorySessionStore, SessionConfig};
pub use settings::{MailerSettings, SettingsError, SettingsStore, SiteSettings};

#[cfg(feature = "auth")]
pub use auth::{Argon2Config, Argon2PasswordService};

#[cfg(feature = "postgres")]
pub use database::{PostgresAccountRepository, PostgresPostRepository, connect, ensure_schema};

#[cfg(feature = "redis")]
pub use session::{RedisConfig, RedisSessionStore};

#[cfg(feature = "mailgun")]
pub use notify::{MailgunConfig, MailgunDispatcher};
