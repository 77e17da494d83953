use async_trait::async_trait;

use vertigo_core::ports::{DispatchError, NotificationDispatcher, RecoveryNotice};

/// Writes recovery notices to the log instead of sending them.
///
/// For development setups without mail credentials.
#[derive(Debug, Clone)]
pub struct LogDispatcher {
    hostname: String,
}

impl LogDispatcher {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn send_recovery(&self, notice: RecoveryNotice) -> Result<(), DispatchError> {
        let link = super::recovery_link(&self.hostname, notice.account_id, &notice.token);
        tracing::info!(
            account_id = %notice.account_id,
            link = %link,
            "Recovery notice (not delivered, log dispatcher)"
        );
        Ok(())
    }
}
