//! Derived text fields: slugs and excerpts.

use crate::error::DomainError;
use crate::ports::Sanitizer;

/// Number of words kept in an excerpt.
pub const EXCERPT_WORDS: usize = 15;

/// Slugs that would shadow a route of the front end.
pub const RESERVED_SLUGS: &[&str] = &["new"];

/// Derive the base slug for a title.
pub fn slug_for(title: &str) -> Result<String, DomainError> {
    let slug = slug::slugify(title);

    if slug.is_empty() {
        return Err(DomainError::Validation(
            "title must contain at least one letter or digit".to_string(),
        ));
    }
    if RESERVED_SLUGS.contains(&slug.as_str()) {
        return Err(DomainError::Validation(format!(
            "slug '{slug}' collides with a route name"
        )));
    }

    Ok(slug)
}

/// Slug for the `n`th post sharing the same base slug. The first one keeps the base.
pub fn disambiguate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

/// Plain-text summary made of the first [`EXCERPT_WORDS`] words of `content`.
pub fn excerpt(content: &str, sanitizer: &dyn Sanitizer) -> String {
    let head = content
        .split_whitespace()
        .take(EXCERPT_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    let normalized = sanitizer.normalize_line_breaks(&head);
    let plain = sanitizer.strip_tags(normalized.trim());

    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text words of a markup fragment, in document order.
pub fn plain_words(html: &str, sanitizer: &dyn Sanitizer) -> Vec<String> {
    let plain = sanitizer.strip_tags(&sanitizer.normalize_line_breaks(html));
    plain.split_whitespace().map(str::to_string).collect()
}
