//! Authentication ports: password hashing and session storage.

use async_trait::async_trait;
use uuid::Uuid;

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password with a fresh salt.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored digest.
    ///
    /// `Ok(false)` on mismatch; `Err` only when the digest itself is unusable.
    fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError>;
}

/// Maps opaque session tokens to account identifiers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a token. Backend failures are logged and read as absent.
    async fn get(&self, token: &str) -> Option<Uuid>;

    /// Bind a token to an account.
    async fn set(&self, token: &str, account_id: Uuid) -> Result<(), SessionError>;

    /// Forget a token. Clearing an unknown token is not an error.
    async fn clear(&self, token: &str) -> Result<(), SessionError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Hashing error: {0}")]
    HashingError(String),
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
