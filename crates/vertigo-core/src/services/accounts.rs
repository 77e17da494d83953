//! Account management: registration, login, sessions and password recovery.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, AccountChanges, Profile, SortOrder};
use crate::error::{DomainError, RepoError};
use crate::ports::{AccountRepository, AuthError, BaseRepository, SessionStore};
use crate::services::CredentialService;

/// Input for [`AccountService::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub location: String,
}

pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionStore>,
    credentials: CredentialService,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionStore>,
        credentials: CredentialService,
    ) -> Self {
        Self {
            accounts,
            sessions,
            credentials,
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<Profile, DomainError> {
        let Registration {
            name,
            email,
            password,
            location,
        } = registration;

        let email = email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::Validation("invalid email".to_string()));
        }
        if password.is_empty() {
            return Err(DomainError::Validation("password is required".to_string()));
        }
        validate_location(&location)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Validation("email exists".to_string()));
        }

        let digest = self.credentials.hash(&password)?;
        let account = Account::new(name, email, digest, location);

        let account = self.accounts.insert(account).await.map_err(|e| match e {
            RepoError::Constraint(_) => DomainError::Validation("email exists".to_string()),
            other => DomainError::from_repo(other, "account", "new"),
        })?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(account.into_profile())
    }

    /// Check an email/password pair.
    ///
    /// Unknown emails are `NotFound`, bad passwords `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, DomainError> {
        let account = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("account", mask_email(email)))?;

        if !self.credentials.verify(&account.digest, password) {
            tracing::info!(account_id = %account.id, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(account.into_profile())
    }

    /// Start a session for an account and return its opaque token.
    pub async fn open_session(&self, account_id: Uuid) -> Result<String, DomainError> {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());

        self.sessions.set(&token, account_id).await.map_err(|e| {
            tracing::error!(account_id = %account_id, error = %e, "Failed to store session");
            DomainError::Internal("session store unavailable".to_string())
        })?;

        Ok(token)
    }

    pub async fn logout(&self, token: &str) -> Result<(), DomainError> {
        self.sessions.clear(token).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to clear session");
            DomainError::Internal("session store unavailable".to_string())
        })
    }

    /// Resolve a session token to the account behind it.
    pub async fn resolve_session(&self, token: &str) -> Result<Profile, DomainError> {
        let account_id = self
            .sessions
            .get(token)
            .await
            .ok_or(AuthError::Unauthenticated)?;

        match self.load(account_id).await {
            Ok(account) => Ok(account.into_profile()),
            Err(DomainError::NotFound { .. }) => {
                tracing::debug!(account_id = %account_id, "Session points at a removed account");
                if let Err(e) = self.sessions.clear(token).await {
                    tracing::warn!(error = %e, "Failed to clear stale session");
                }
                Err(AuthError::Unauthenticated.into())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_profile(&self, account_id: Uuid) -> Result<Profile, DomainError> {
        Ok(self.load(account_id).await?.into_profile())
    }

    /// Every registered account, oldest first.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, DomainError> {
        let accounts = self
            .accounts
            .list(SortOrder::CreatedAsc)
            .await
            .map_err(|e| DomainError::from_repo(e, "account", "all"))?;

        Ok(accounts.into_iter().map(Account::into_profile).collect())
    }

    /// Update the mutable account fields (name, digest, location, recovery token).
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        changes: AccountChanges,
    ) -> Result<Profile, DomainError> {
        if let Some(location) = &changes.location {
            validate_location(location)?;
        }
        if changes.is_empty() {
            return self.get_profile(account_id).await;
        }

        let account = self
            .accounts
            .update_fields(account_id, changes)
            .await
            .map_err(|e| DomainError::from_repo(e, "account", account_id))?;

        Ok(account.into_profile())
    }

    pub async fn request_recovery(&self, email: &str) -> Result<(), DomainError> {
        let account = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("account", mask_email(email)))?;

        self.credentials.issue_recovery(&account).await.map(|_| ())
    }

    /// Re-send the outstanding recovery token after a failed delivery.
    pub async fn resend_recovery(&self, email: &str) -> Result<(), DomainError> {
        let account = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("account", mask_email(email)))?;

        self.credentials.resend_recovery(&account).await
    }

    /// Replace the digest and clear any recovery token.
    pub async fn reset_password(
        &self,
        account_id: Uuid,
        new_password: &str,
    ) -> Result<(), DomainError> {
        if new_password.is_empty() {
            return Err(DomainError::Validation("password is required".to_string()));
        }

        let changes = AccountChanges {
            digest: Some(self.credentials.hash(new_password)?),
            recovery: Some(None),
            ..AccountChanges::default()
        };

        self.accounts
            .update_fields(account_id, changes)
            .await
            .map_err(|e| DomainError::from_repo(e, "account", account_id))?;

        tracing::info!(account_id = %account_id, "Password reset");
        Ok(())
    }

    /// Reset a password with a recovery token instead of the old password.
    pub async fn redeem_recovery(
        &self,
        account_id: Uuid,
        token: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let account = self.load(account_id).await?;

        match account.recovery.as_deref() {
            Some(outstanding) if !token.is_empty() && outstanding == token => {
                self.reset_password(account_id, new_password).await
            }
            _ => Err(AuthError::InvalidCredentials.into()),
        }
    }

    /// Delete the session's account after re-checking its password.
    pub async fn delete_account(&self, token: &str, password: &str) -> Result<(), DomainError> {
        let profile = self.resolve_session(token).await?;
        let account = self.load(profile.id).await?;

        if !self.credentials.verify(&account.digest, password) {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.accounts
            .delete(account.id)
            .await
            .map_err(|e| DomainError::from_repo(e, "account", account.id))?;
        self.logout(token).await?;

        tracing::info!(account_id = %account.id, "Account deleted");
        Ok(())
    }

    async fn load(&self, account_id: Uuid) -> Result<Account, DomainError> {
        self.accounts
            .find_by_id(account_id)
            .await
            .map_err(|e| DomainError::from_repo(e, "account", account_id))?
            .ok_or_else(|| DomainError::not_found("account", account_id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        self.accounts
            .find_by_email(email.trim())
            .await
            .map_err(|e| DomainError::from_repo(e, "account", mask_email(email)))
    }
}

fn validate_location(location: &str) -> Result<(), DomainError> {
    location
        .parse::<chrono_tz::Tz>()
        .map(|_| ())
        .map_err(|_| DomainError::Validation("invalid location".to_string()))
}

/// Keep emails out of logs and error messages: `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}
