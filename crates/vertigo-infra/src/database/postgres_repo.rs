//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QueryTrait,
    Set,
};
use uuid::Uuid;

use vertigo_core::domain::{Account, AccountChanges, Post, PostChanges, PostFilter, SortOrder};
use vertigo_core::error::RepoError;
use vertigo_core::ports::{AccountRepository, BaseRepository, PostRepository};
use vertigo_core::services::mask_email;

use super::entity::account::{self, Entity as AccountEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL account repository.
pub type PostgresAccountRepository = PostgresBaseRepository<AccountEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        tracing::debug!(email = %mask_email(email), "Finding account by email");

        let result = AccountEntity::find()
            .filter(account::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Account, RepoError> {
        if changes.is_empty() {
            return <Self as BaseRepository<Account, Uuid>>::find_by_id(self, id)
                .await?
                .ok_or(RepoError::NotFound);
        }

        let mut active = account::ActiveModel {
            id: ActiveValue::Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(digest) = changes.digest {
            active.digest = Set(digest);
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(recovery) = changes.recovery {
            active.recovery = Set(recovery);
        }

        let model = active.update(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn list(&self, order: SortOrder) -> Result<Vec<Account>, RepoError> {
        let query = AccountEntity::find();
        let query = match order {
            SortOrder::CreatedAsc => query.order_by_asc(account::Column::CreatedAt),
            SortOrder::CreatedDesc => query.order_by_desc(account::Column::CreatedAt),
        };

        let result = query.all(&self.db).await.map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn update_fields(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError> {
        let mut active = post::ActiveModel {
            id: ActiveValue::Unchanged(id),
            ..Default::default()
        };
        let mut touched = false;

        if let Some(title) = changes.title {
            active.title = Set(title);
            touched = true;
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
            touched = true;
        }
        if let Some(excerpt) = changes.excerpt {
            active.excerpt = Set(excerpt);
            touched = true;
        }
        if let Some(published) = changes.published {
            active.published = Set(published);
            touched = true;
        }
        if let Some(view_count) = changes.view_count {
            active.view_count = Set(post::to_column_count(view_count));
            touched = true;
        }
        if let Some(updated_at) = changes.updated_at {
            active.updated_at = Set(updated_at.into());
            touched = true;
        }

        if !touched {
            return <Self as BaseRepository<Post, Uuid>>::find_by_id(self, id)
                .await?
                .ok_or(RepoError::NotFound);
        }

        let model = active.update(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn list(&self, filter: PostFilter, order: SortOrder) -> Result<Vec<Post>, RepoError> {
        let query = PostEntity::find()
            .apply_if(filter.published, |q, published| {
                q.filter(post::Column::Published.eq(published))
            })
            .apply_if(filter.author, |q, author| {
                q.filter(post::Column::Author.eq(author))
            });

        let query = match order {
            SortOrder::CreatedAsc => query.order_by_asc(post::Column::CreatedAt),
            SortOrder::CreatedDesc => query.order_by_desc(post::Column::CreatedAt),
        };

        let result = query.all(&self.db).await.map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
