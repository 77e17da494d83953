//! Post lifecycle: drafts, edits, publishing and reads.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{AuthorView, Post, PostChanges, PostEdit, PostFilter, Profile, SortOrder};
use crate::error::{DomainError, RepoError};
use crate::ports::{BaseRepository, JobQueue, PostRepository, Sanitizer};
use crate::services::AccountService;
use crate::services::guard;
use crate::services::jobs::{BackgroundJob, dispatch_detached};
use crate::services::text;

/// Upper bound on `-N` suffixes tried when disambiguating a slug.
const MAX_SLUG_SUFFIX: u32 = 1000;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    accounts: Arc<AccountService>,
    sanitizer: Arc<dyn Sanitizer>,
    jobs: Arc<dyn JobQueue>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        accounts: Arc<AccountService>,
        sanitizer: Arc<dyn Sanitizer>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            posts,
            accounts,
            sanitizer,
            jobs,
        }
    }

    /// Create a draft owned by the session's account.
    pub async fn create(
        &self,
        session: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, DomainError> {
        let author = self.accounts.resolve_session(session).await?;

        let base = text::slug_for(title)?;
        let excerpt = text::excerpt(content, self.sanitizer.as_ref());

        // Another create can take the free slug between lookup and insert.
        let mut from = 1;
        loop {
            let (n, slug) = self.free_slug(&base, from).await?;
            let post = Post::new(
                author.id,
                title.to_string(),
                content.to_string(),
                slug,
                excerpt.clone(),
            );

            match self.posts.insert(post).await {
                Ok(post) => {
                    tracing::info!(post_id = %post.id, slug = %post.slug, "Draft created");
                    return Ok(post);
                }
                Err(RepoError::Constraint(_)) => {
                    tracing::debug!(base = %base, attempt = n, "Slug taken meanwhile, trying next");
                    from = n + 1;
                }
                Err(other) => return Err(DomainError::from_repo(other, "post", title)),
            }
        }
    }

    /// Fetch a post and count the view in the background.
    ///
    /// The returned post carries the view count as it was before this read.
    pub async fn get(&self, slug: &str) -> Result<Post, DomainError> {
        let post = self.find(slug).await?;

        dispatch_detached(
            self.jobs.clone(),
            BackgroundJob::IncrementViews { post_id: post.id }.into_job(),
        );

        Ok(post)
    }

    pub async fn update(
        &self,
        session: &str,
        slug: &str,
        edit: PostEdit,
    ) -> Result<Post, DomainError> {
        let (_, post) = self.load_owned(session, slug).await?;

        if edit.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DomainError::Validation("title is required".to_string()));
        }

        let excerpt = edit
            .content
            .as_deref()
            .map(|content| text::excerpt(content, self.sanitizer.as_ref()));
        let changes = PostChanges {
            title: edit.title,
            content: edit.content,
            excerpt,
            updated_at: Some(Utc::now()),
            ..PostChanges::default()
        };

        let post = self
            .posts
            .update_fields(post.id, changes)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", slug))?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "Post updated");
        Ok(post)
    }

    /// Move a draft to published. Publishing twice is a no-op.
    pub async fn publish(&self, session: &str, slug: &str) -> Result<(), DomainError> {
        let (_, post) = self.load_owned(session, slug).await?;

        if post.published {
            return Ok(());
        }

        let changes = PostChanges {
            published: Some(true),
            updated_at: Some(Utc::now()),
            ..PostChanges::default()
        };
        self.posts
            .update_fields(post.id, changes)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", slug))?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "Post published");
        Ok(())
    }

    pub async fn delete(&self, session: &str, slug: &str) -> Result<(), DomainError> {
        let (_, post) = self.load_owned(session, slug).await?;

        self.posts
            .delete(post.id)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", slug))?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "Post deleted");
        Ok(())
    }

    /// Published posts, newest first. Drafts never appear here.
    pub async fn list_published(&self) -> Result<Vec<Post>, DomainError> {
        self.posts
            .list(PostFilter::published(), SortOrder::CreatedDesc)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", "published"))
    }

    /// Every post of the session's account, in creation order.
    pub async fn list_by_author(&self, session: &str) -> Result<Vec<Post>, DomainError> {
        let author = self.accounts.resolve_session(session).await?;

        self.posts
            .list(PostFilter::by_author(author.id), SortOrder::CreatedAsc)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", author.id))
    }

    /// An author's profile with their published posts.
    pub async fn author(&self, account_id: Uuid) -> Result<AuthorView, DomainError> {
        let profile = self.accounts.get_profile(account_id).await?;
        let posts = self
            .posts
            .list(PostFilter::published_by(account_id), SortOrder::CreatedAsc)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", account_id))?;

        Ok(AuthorView { profile, posts })
    }

    /// Every account with its published posts, oldest account first.
    pub async fn list_authors(&self) -> Result<Vec<AuthorView>, DomainError> {
        let profiles = self.accounts.list_profiles().await?;
        let mut remaining = self
            .posts
            .list(PostFilter::published(), SortOrder::CreatedAsc)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", "published"))?;

        let mut authors = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let (posts, rest): (Vec<Post>, Vec<Post>) =
                remaining.into_iter().partition(|p| p.author == profile.id);
            remaining = rest;
            authors.push(AuthorView { profile, posts });
        }

        Ok(authors)
    }

    async fn find(&self, slug: &str) -> Result<Post, DomainError> {
        self.posts
            .find_by_slug(slug)
            .await
            .map_err(|e| DomainError::from_repo(e, "post", slug))?
            .ok_or_else(|| DomainError::not_found("post", slug))
    }

    async fn load_owned(&self, session: &str, slug: &str) -> Result<(Profile, Post), DomainError> {
        let actor = self.accounts.resolve_session(session).await?;
        let post = self.find(slug).await?;

        if let Err(e) = guard::authorize(actor.id, &post).require_owner() {
            tracing::warn!(account_id = %actor.id, slug = %slug, "Rejected edit by non-author");
            return Err(e);
        }

        Ok((actor, post))
    }

    /// First free slug for `base`, trying suffix numbers from `from` upwards.
    async fn free_slug(&self, base: &str, from: u32) -> Result<(u32, String), DomainError> {
        for n in from..=MAX_SLUG_SUFFIX {
            let candidate = text::disambiguate(base, n);
            let taken = self
                .posts
                .find_by_slug(&candidate)
                .await
                .map_err(|e| DomainError::from_repo(e, "post", &candidate))?;
            if taken.is_none() {
                return Ok((n, candidate));
            }
        }

        Err(DomainError::Validation(format!(
            "too many posts share the slug '{base}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::ports::AuthError;
    use crate::services::jobs::INCREMENT_VIEWS;
    use crate::test_support::{Harness, MemoryPosts, TagStripper};

    /// Slug lookups that never see rows written by other creates.
    struct StaleSlugReads(Arc<MemoryPosts>);

    #[async_trait]
    impl BaseRepository<Post, Uuid> for StaleSlugReads {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            self.0.find_by_id(id).await
        }

        async fn insert(&self, post: Post) -> Result<Post, RepoError> {
            self.0.insert(post).await
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.0.delete(id).await
        }
    }

    #[async_trait]
    impl PostRepository for StaleSlugReads {
        async fn find_by_slug(&self, _slug: &str) -> Result<Option<Post>, RepoError> {
            Ok(None)
        }

        async fn update_fields(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError> {
            self.0.update_fields(id, changes).await
        }

        async fn list(&self, filter: PostFilter, order: SortOrder) -> Result<Vec<Post>, RepoError> {
            self.0.list(filter, order).await
        }
    }

    #[tokio::test]
    async fn test_create_derives_fields() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;

        let post = service
            .create(&session, "Hello, World!", "<p>First <b>post</b></p>")
            .await
            .unwrap();

        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.excerpt, "First post");
        assert!(!post.published);
        assert_eq!(post.view_count, 0);
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let harness = Harness::new();
        let (service, _) = harness.post_service_with_author("a@example.com").await;

        let result = service.create("bogus", "Title", "Body").await;

        assert!(matches!(
            result,
            Err(DomainError::Auth(AuthError::Unauthenticated))
        ));
    }

    #[tokio::test]
    async fn test_colliding_titles_get_suffixes() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;

        let first = service.create(&session, "Same", "one").await.unwrap();
        let second = service.create(&session, "same!", "two").await.unwrap();
        let third = service.create(&session, "SAME", "three").await.unwrap();

        assert_eq!(first.slug, "same");
        assert_eq!(second.slug, "same-2");
        assert_eq!(third.slug, "same-3");
    }

    #[tokio::test]
    async fn test_slug_taken_between_lookup_and_insert_moves_on() {
        let harness = Harness::new();
        let session = harness.session_for("a@example.com").await;
        let service = PostService::new(
            Arc::new(StaleSlugReads(harness.posts.clone())),
            Arc::new(harness.account_service()),
            Arc::new(TagStripper),
            harness.jobs.clone(),
        );

        let first = service.create(&session, "Same", "one").await.unwrap();
        let second = service.create(&session, "Same", "two").await.unwrap();
        let third = service.create(&session, "Same", "three").await.unwrap();

        assert_eq!(first.slug, "same");
        assert_eq!(second.slug, "same-2");
        assert_eq!(third.slug, "same-3");
    }

    #[tokio::test]
    async fn test_author_view_shows_published_posts_only() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;
        let author = harness.account_service().resolve_session(&session).await.unwrap();
        service.create(&session, "Draft", "unfinished").await.unwrap();
        let live = service.create(&session, "Live", "done").await.unwrap();
        service.publish(&session, &live.slug).await.unwrap();

        let view = service.author(author.id).await.unwrap();

        assert_eq!(view.profile, author);
        let slugs: Vec<_> = view.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["live"]);
    }

    #[tokio::test]
    async fn test_author_view_of_unknown_account_is_not_found() {
        let harness = Harness::new();
        let (service, _) = harness.post_service_with_author("a@example.com").await;

        let result = service.author(Uuid::new_v4()).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_authors_groups_published_posts() {
        let harness = Harness::new();
        let (service, alice) = harness.post_service_with_author("alice@example.com").await;
        let bob = harness.session_for("bob@example.com").await;
        let first = service.create(&alice, "First", "one").await.unwrap();
        let second = service.create(&bob, "Second", "two").await.unwrap();
        service.create(&bob, "Hidden", "draft").await.unwrap();
        service.publish(&alice, &first.slug).await.unwrap();
        service.publish(&bob, &second.slug).await.unwrap();

        let authors = service.list_authors().await.unwrap();

        let pages: Vec<(&str, Vec<&str>)> = authors
            .iter()
            .map(|a| {
                let slugs = a.posts.iter().map(|p| p.slug.as_str()).collect();
                (a.profile.email.as_str(), slugs)
            })
            .collect();
        assert_eq!(
            pages,
            vec![
                ("alice@example.com", vec!["first"]),
                ("bob@example.com", vec!["second"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_other_author_is_unauthorized() {
        let harness = Harness::new();
        let (service, alice) = harness.post_service_with_author("alice@example.com").await;
        let bob = harness.session_for("bob@example.com").await;
        let post = service.create(&alice, "Alice's", "words").await.unwrap();

        let edit = PostEdit {
            content: Some("defaced".to_string()),
            ..PostEdit::default()
        };
        assert!(matches!(
            service.update(&bob, &post.slug, edit).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            service.publish(&bob, &post.slug).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            service.delete(&bob, &post.slug).await,
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_slug_and_rederives_excerpt() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;
        let post = service.create(&session, "Original", "old body").await.unwrap();

        let updated = service
            .update(
                &session,
                &post.slug,
                PostEdit {
                    title: Some("Renamed".to_string()),
                    content: Some("<i>new</i> body".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.slug, "original");
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.excerpt, "new body");
        assert_eq!(updated.author, post.author);
    }

    #[tokio::test]
    async fn test_publish_is_idempotent_and_drafts_stay_hidden() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;
        let draft = service.create(&session, "Draft", "not yet").await.unwrap();
        let public = service.create(&session, "Public", "hello").await.unwrap();

        service.publish(&session, &public.slug).await.unwrap();
        service.publish(&session, &public.slug).await.unwrap();

        let listed = service.list_published().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slug, public.slug);
        assert!(listed.iter().all(|p| p.slug != draft.slug));
    }

    #[tokio::test]
    async fn test_list_orders() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;
        for title in ["First", "Second", "Third"] {
            let post = service.create(&session, title, "body").await.unwrap();
            service.publish(&session, &post.slug).await.unwrap();
        }

        let mine: Vec<_> = service
            .list_by_author(&session)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        let public: Vec<_> = service
            .list_published()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();

        assert_eq!(mine, ["First", "Second", "Third"]);
        assert_eq!(public, ["Third", "Second", "First"]);
    }

    #[tokio::test]
    async fn test_get_returns_pre_increment_and_queues_view() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;
        let post = service.create(&session, "Read me", "body").await.unwrap();

        let read = service.get(&post.slug).await.unwrap();
        harness.settle().await;

        assert_eq!(read.view_count, 0);
        let jobs = harness.jobs.enqueued();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_type, INCREMENT_VIEWS);
    }

    #[tokio::test]
    async fn test_missing_post() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;

        assert!(matches!(
            service.get("nope").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.publish(&session, "nope").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_author_can_delete() {
        let harness = Harness::new();
        let (service, session) = harness.post_service_with_author("a@example.com").await;
        let post = service.create(&session, "Doomed", "body").await.unwrap();

        service.delete(&session, &post.slug).await.unwrap();

        assert!(service.list_by_author(&session).await.unwrap().is_empty());
    }
}
