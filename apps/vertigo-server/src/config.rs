//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use vertigo_infra::{
    Argon2Config, DatabaseConfig, InMemoryJobQueueConfig, SessionConfig, SettingsStore,
};

#[cfg(feature = "redis")]
use vertigo_infra::RedisConfig;

/// Where recovery notices go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    /// Log the reset link; nothing is delivered.
    Log,
    /// Deliver through Mailgun with the credentials from the site settings.
    Mailgun,
}

impl MailBackend {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("log") => Self::Log,
            Some("mailgun") => Self::Mailgun,
            Some(other) => {
                tracing::warn!(value = %other, "Unknown MAIL_BACKEND, falling back to default");
                Self::default_backend()
            }
            None => Self::default_backend(),
        }
    }

    fn default_backend() -> Self {
        if cfg!(feature = "mailgun") {
            Self::Mailgun
        } else {
            Self::Log
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    pub sessions: SessionConfig,
    pub jobs: InMemoryJobQueueConfig,
    pub argon2: Argon2Config,
    pub settings_path: PathBuf,
    pub mail_backend: MailBackend,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: RedisConfig::from_env(),
            sessions: SessionConfig::from_env(),
            jobs: InMemoryJobQueueConfig::from_env(),
            argon2: Argon2Config::from_env(),
            settings_path: SettingsStore::path_from_env(),
            mail_backend: MailBackend::parse(env::var("MAIL_BACKEND").ok().as_deref()),
        }
    }
}
