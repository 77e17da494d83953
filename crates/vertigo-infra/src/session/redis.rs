//! Redis session store with automatic reconnection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use vertigo_core::ports::{SessionError, SessionStore};

use super::SessionConfig;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix prepended to every session key.
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "vertigo:session:".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables. `None` when `REDIS_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("REDIS_URL").ok()?;
        let defaults = Self::default();

        Some(Self {
            url,
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            key_prefix: std::env::var("REDIS_SESSION_PREFIX").unwrap_or(defaults.key_prefix),
        })
    }
}

/// Redis-backed session store. Expiry is delegated to Redis key TTLs.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    redis: RedisConfig,
    sessions: SessionConfig,
}

impl RedisSessionStore {
    pub async fn new(redis: RedisConfig, sessions: SessionConfig) -> Result<Self, SessionError> {
        let client =
            Client::open(redis.url.as_str()).map_err(|e| SessionError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(redis.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| SessionError::Connection("Connection timed out".to_string()))?
            .map_err(|e| SessionError::Connection(e.to_string()))?;

        tracing::info!(url = %redis.url, "Connected to Redis session store");

        Ok(Self {
            conn,
            redis,
            sessions,
        })
    }

    fn key(&self, token: &str) -> String {
        format!("{}{}", self.redis.key_prefix, token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, token: &str) -> Option<Uuid> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.key(token)).await {
            Ok(value) => value.and_then(|v| Uuid::parse_str(&v).ok()),
            Err(e) => {
                tracing::warn!(error = %e, "Redis session lookup failed");
                None
            }
        }
    }

    async fn set(&self, token: &str, account_id: Uuid) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let key = self.key(token);
        let value = account_id.to_string();

        match self.sessions.ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(|e| SessionError::Operation(e.to_string())),
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| SessionError::Operation(e.to_string())),
        }
    }

    async fn clear(&self, token: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(token))
            .await
            .map_err(|e| SessionError::Operation(e.to_string()))
    }
}
