//! In-memory repositories.
//!
//! Used when no database is configured and in integration tests.
//! Records are lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use vertigo_core::domain::{Account, AccountChanges, Post, PostChanges, PostFilter, SortOrder};
use vertigo_core::error::RepoError;
use vertigo_core::ports::{AccountRepository, BaseRepository, PostRepository};

/// Account records keyed by ID. Email addresses are unique.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    records: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Account, Uuid> for InMemoryAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn insert(&self, account: Account) -> Result<Account, RepoError> {
        let mut records = self.records.write().await;

        if records.contains_key(&account.id) {
            return Err(RepoError::Constraint("Account id already exists".to_string()));
        }
        if records.values().any(|a| a.email == account.email) {
            return Err(RepoError::Constraint("Email already registered".to_string()));
        }

        records.insert(account.id, account.clone());
        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.records
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Account, RepoError> {
        let mut records = self.records.write().await;
        let account = records.get_mut(&id).ok_or(RepoError::NotFound)?;
        changes.apply_to(account);
        Ok(account.clone())
    }

    async fn list(&self, order: SortOrder) -> Result<Vec<Account>, RepoError> {
        let mut accounts: Vec<Account> = self.records.read().await.values().cloned().collect();

        match order {
            SortOrder::CreatedAsc => accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::CreatedDesc => accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        Ok(accounts)
    }
}

/// Post records keyed by ID. Slugs are unique.
#[derive(Default)]
pub struct InMemoryPostRepository {
    records: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut records = self.records.write().await;

        if records.contains_key(&post.id) {
            return Err(RepoError::Constraint("Post id already exists".to_string()));
        }
        if records.values().any(|p| p.slug == post.slug) {
            return Err(RepoError::Constraint("Slug already taken".to_string()));
        }

        records.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.records
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn update_fields(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError> {
        let mut records = self.records.write().await;
        let post = records.get_mut(&id).ok_or(RepoError::NotFound)?;
        changes.apply_to(post);
        Ok(post.clone())
    }

    async fn list(&self, filter: PostFilter, order: SortOrder) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .records
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        match order {
            SortOrder::CreatedAsc => posts.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::CreatedDesc => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        Ok(posts)
    }
}
