use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, AccountChanges, Post, PostChanges, PostFilter, SortOrder};
use crate::error::RepoError;

/// Generic repository trait defining the CRUD operations shared by all records.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique field clashes are `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` if nothing was removed.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Account repository.
#[async_trait]
pub trait AccountRepository: BaseRepository<Account, Uuid> {
    /// Find an account by its (unique) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError>;

    /// Apply a partial update atomically and return the stored record.
    async fn update_fields(&self, id: Uuid, changes: AccountChanges)
    -> Result<Account, RepoError>;

    /// Every account, ordered by creation time.
    async fn list(&self, order: SortOrder) -> Result<Vec<Account>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Find a post by its (unique) slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Apply a partial update atomically and return the stored record.
    async fn update_fields(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError>;

    /// All posts matching `filter`, ordered by creation time.
    async fn list(&self, filter: PostFilter, order: SortOrder) -> Result<Vec<Post>, RepoError>;
}
