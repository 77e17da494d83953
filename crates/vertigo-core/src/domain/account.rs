use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account entity - the single author (or any registered user) of the blog.
///
/// `digest` and `recovery` never leave the process: they are skipped on
/// serialization and stripped by [`Account::into_profile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub digest: String,
    #[serde(skip_serializing, default)]
    pub recovery: Option<String>,
    /// IANA timezone identifier, e.g. `Europe/Helsinki`.
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with generated ID and timestamp.
    pub fn new(name: String, email: String, digest: String, location: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            digest,
            recovery: None,
            location,
            created_at: Utc::now(),
        }
    }

    pub fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            name: self.name,
            email: self.email,
            location: self.location,
            created_at: self.created_at,
        }
    }
}

/// Outward view of an account, without any credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

/// Partial account update.
///
/// Only these fields are mutable after registration. `recovery` uses a
/// nested option: `Some(None)` clears the token, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub digest: Option<String>,
    pub location: Option<String>,
    pub recovery: Option<Option<String>>,
}

impl AccountChanges {
    pub fn clear_recovery() -> Self {
        Self {
            recovery: Some(None),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.digest.is_none()
            && self.location.is_none()
            && self.recovery.is_none()
    }

    /// Apply the changes to an in-memory record.
    pub fn apply_to(self, account: &mut Account) {
        if let Some(name) = self.name {
            account.name = name;
        }
        if let Some(digest) = self.digest {
            account.digest = digest;
        }
        if let Some(location) = self.location {
            account.location = location;
        }
        if let Some(recovery) = self.recovery {
            account.recovery = recovery;
        }
    }
}
