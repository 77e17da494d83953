//! Session stores - Redis and in-memory fallback.

mod memory;

pub use memory::InMemorySessionStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisSessionStore};

use std::time::Duration;

/// Session lifetime settings shared by every store.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session stays valid after login. `None` keeps it until logout.
    pub ttl: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Some(Duration::from_secs(30 * 24 * 3600)),
        }
    }
}

impl SessionConfig {
    /// `SESSION_TTL_HOURS=0` disables expiry.
    pub fn from_env() -> Self {
        Self::from_hours(
            std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok()),
        )
    }

    fn from_hours(hours: Option<u64>) -> Self {
        match hours {
            Some(0) => Self { ttl: None },
            Some(hours) => match hours.checked_mul(3600) {
                Some(secs) => Self {
                    ttl: Some(Duration::from_secs(secs)),
                },
                None => {
                    tracing::warn!(hours, "SESSION_TTL_HOURS out of range, using the default");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}
