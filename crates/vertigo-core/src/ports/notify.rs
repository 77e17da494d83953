//! Notification port - delivery of account recovery messages.

use async_trait::async_trait;
use uuid::Uuid;

/// Everything a recovery message needs to reach its recipient.
#[derive(Debug, Clone)]
pub struct RecoveryNotice {
    pub account_id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_recovery(&self, notice: RecoveryNotice) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatcher not configured: {0}")]
    NotConfigured(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
