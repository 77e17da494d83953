//! Approximate word-level search over published posts.

use std::sync::Arc;

use crate::domain::Post;
use crate::error::DomainError;
use crate::ports::Sanitizer;
use crate::services::{PostService, text};

/// Minimum Jaro-Winkler similarity for a word to count as a hit.
pub const MATCH_THRESHOLD: f64 = 0.90;

pub struct SearchService {
    posts: Arc<PostService>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl SearchService {
    pub fn new(posts: Arc<PostService>, sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { posts, sanitizer }
    }

    /// Published posts containing a word close to `query`, newest first.
    pub async fn search(&self, query: &str) -> Result<Vec<Post>, DomainError> {
        let corpus = self.posts.list_published().await?;
        let matched = filter_matches(query, corpus, self.sanitizer.as_ref());

        tracing::debug!(query = %query, hits = matched.len(), "Search finished");
        Ok(matched)
    }
}

/// Keep the posts of `corpus` that match `query`, preserving their order.
pub fn filter_matches(query: &str, corpus: Vec<Post>, sanitizer: &dyn Sanitizer) -> Vec<Post> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    corpus
        .into_iter()
        .filter(|post| post_matches(&query, post, sanitizer))
        .collect()
}

/// Content words are tried first, then title words; the first hit ends the scan.
fn post_matches(query: &str, post: &Post, sanitizer: &dyn Sanitizer) -> bool {
    text::plain_words(&post.content, sanitizer)
        .iter()
        .any(|word| is_close(word, query))
        || post.title.split_whitespace().any(|word| is_close(word, query))
}

fn is_close(word: &str, query: &str) -> bool {
    strsim::jaro_winkler(&word.to_lowercase(), query) >= MATCH_THRESHOLD
}
