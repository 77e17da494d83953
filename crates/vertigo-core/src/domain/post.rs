use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Profile;

/// Post entity - a blog post in draft or published state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub author: Uuid,
    pub published: bool,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft. Slug and excerpt are derived by the caller.
    pub fn new(
        author: Uuid,
        title: String,
        content: String,
        slug: String,
        excerpt: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            excerpt,
            slug,
            author,
            published: false,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields an author may submit when editing a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostEdit {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Partial post update as persisted. Slug, author and creation time are not representable.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub published: Option<bool>,
    pub view_count: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PostChanges {
    pub fn apply_to(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(published) = self.published {
            post.published = published;
        }
        if let Some(view_count) = self.view_count {
            post.view_count = view_count;
        }
        if let Some(updated_at) = self.updated_at {
            post.updated_at = updated_at;
        }
    }
}

/// Predicate for listing posts. `None` fields do not constrain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub published: Option<bool>,
    pub author: Option<Uuid>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            published: Some(true),
            author: None,
        }
    }

    pub fn by_author(author: Uuid) -> Self {
        Self {
            published: None,
            author: Some(author),
        }
    }

    pub fn published_by(author: Uuid) -> Self {
        Self {
            published: Some(true),
            author: Some(author),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.published.is_none_or(|p| post.published == p)
            && self.author.is_none_or(|a| post.author == a)
    }
}

/// An author's public page: the profile and their published posts, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorView {
    pub profile: Profile,
    pub posts: Vec<Post>,
}

/// Ordering by creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    CreatedAsc,
    CreatedDesc,
}
