//! Password digests and recovery tokens.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, AccountChanges};
use crate::error::DomainError;
use crate::ports::{
    AccountRepository, JobQueue, NotificationDispatcher, PasswordService, RecoveryNotice,
};
use crate::services::jobs::{BackgroundJob, dispatch_detached};

/// Lifetime of a recovery token.
pub const RECOVERY_TTL_MINUTES: i64 = 180;

/// Hashes and verifies passwords, and issues recovery tokens.
pub struct CredentialService {
    passwords: Arc<dyn PasswordService>,
    accounts: Arc<dyn AccountRepository>,
    jobs: Arc<dyn JobQueue>,
    notifier: Arc<dyn NotificationDispatcher>,
    recovery_ttl: chrono::Duration,
}

impl CredentialService {
    pub fn new(
        passwords: Arc<dyn PasswordService>,
        accounts: Arc<dyn AccountRepository>,
        jobs: Arc<dyn JobQueue>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            passwords,
            accounts,
            jobs,
            notifier,
            recovery_ttl: chrono::Duration::minutes(RECOVERY_TTL_MINUTES),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, DomainError> {
        Ok(self.passwords.hash(password)?)
    }

    /// `false` on mismatch and on unreadable digests; never an error.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        match self.passwords.verify(password, digest) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!(error = %e, "Stored password digest could not be parsed");
                false
            }
        }
    }

    /// Replace the account's recovery token with a fresh one and send it out.
    ///
    /// The token is persisted and its expiry scheduled before the notice is
    /// dispatched. A failed dispatch is returned as [`DomainError::Dispatch`]
    /// but the token stays valid.
    pub async fn issue_recovery(&self, account: &Account) -> Result<String, DomainError> {
        let token = Uuid::new_v4().to_string();

        let changes = AccountChanges {
            recovery: Some(Some(token.clone())),
            ..AccountChanges::default()
        };
        let account = self
            .accounts
            .update_fields(account.id, changes)
            .await
            .map_err(|e| DomainError::from_repo(e, "account", account.id))?;

        let expiry = BackgroundJob::ExpireRecovery {
            account_id: account.id,
        }
        .into_job()
        .delayed(self.recovery_ttl);
        dispatch_detached(self.jobs.clone(), expiry);

        tracing::info!(account_id = %account.id, "Recovery token issued");

        self.send_notice(&account, token.clone()).await?;
        Ok(token)
    }

    /// Send the currently outstanding token again.
    pub async fn resend_recovery(&self, account: &Account) -> Result<(), DomainError> {
        let token = account.recovery.clone().ok_or_else(|| {
            DomainError::Validation("no recovery request is outstanding".to_string())
        })?;
        self.send_notice(account, token).await
    }

    async fn send_notice(&self, account: &Account, token: String) -> Result<(), DomainError> {
        let notice = RecoveryNotice {
            account_id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            token,
        };

        self.notifier.send_recovery(notice).await.map_err(|e| {
            tracing::warn!(account_id = %account.id, error = %e, "Recovery notice not delivered");
            DomainError::Dispatch(e.to_string())
        })
    }
}
