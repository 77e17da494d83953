//! In-memory session store - used when Redis is not configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use vertigo_core::ports::{SessionError, SessionStore};

use super::SessionConfig;

struct SessionEntry {
    account_id: Uuid,
    expires_at: Option<Instant>,
}

impl SessionEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Session store backed by a `HashMap` behind an async `RwLock`.
///
/// Sessions are lost on process restart.
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
    config: SessionConfig,
}

impl InMemorySessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, token: &str) -> Option<Uuid> {
        let entries = self.entries.read().await;
        let entry = entries.get(token)?;

        if entry.is_expired() {
            drop(entries);
            self.entries.write().await.remove(token);
            return None;
        }

        Some(entry.account_id)
    }

    async fn set(&self, token: &str, account_id: Uuid) -> Result<(), SessionError> {
        // Past the clock's range counts as no expiry.
        let expires_at = self
            .config
            .ttl
            .and_then(|ttl| Instant::now().checked_add(ttl));

        self.entries.write().await.insert(
            token.to_string(),
            SessionEntry {
                account_id,
                expires_at,
            },
        );

        Ok(())
    }

    async fn clear(&self, token: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = InMemorySessionStore::default();
        let account = Uuid::new_v4();

        store.set("token", account).await.unwrap();
        assert_eq!(store.get("token").await, Some(account));

        store.clear("token").await.unwrap();
        assert_eq!(store.get("token").await, None);
        store.clear("token").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_expire() {
        let store = InMemorySessionStore::new(SessionConfig {
            ttl: Some(Duration::from_secs(60)),
        });
        store.set("short", Uuid::new_v4()).await.unwrap();
        store.set("other", Uuid::new_v4()).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(store.get("short").await, None);
        assert_eq!(store.purge_expired().await, 1);
    }

    #[tokio::test]
    async fn test_ttl_beyond_clock_range_never_expires() {
        let store = InMemorySessionStore::new(SessionConfig {
            ttl: Some(Duration::MAX),
        });
        let account = Uuid::new_v4();

        store.set("forever", account).await.unwrap();

        assert_eq!(store.get("forever").await, Some(account));
    }
}
