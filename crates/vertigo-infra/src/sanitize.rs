//! Regex-based HTML clean-up for plain-text derivation.
//!
//! This is not an XSS filter. It turns stored post markup into words for
//! excerpts and search.

use std::sync::LazyLock;

use regex::Regex;

use vertigo_core::ports::Sanitizer;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").expect("valid regex")
});

static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|li|ul|ol|h[1-6]|blockquote|pre|tr|td|th|table)\b[^>]*>")
        .expect("valid regex")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

// A tag cut off by the end of input, e.g. an excerpt that stopped mid-tag.
static OPEN_TAG_AT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*$").expect("valid regex"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p\s*>|<br\s*/?>|</br\s*>").expect("valid regex"));

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl HtmlSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for HtmlSanitizer {
    fn strip_tags(&self, html: &str) -> String {
        let text = SCRIPT_OR_STYLE.replace_all(html, "");
        let text = BLOCK_TAG.replace_all(&text, " ");
        let text = ANY_TAG.replace_all(&text, "");
        let text = OPEN_TAG_AT_END.replace_all(&text, "");

        // `&amp;` goes last so `&amp;lt;` stays literal.
        ENTITIES
            .iter()
            .fold(text.into_owned(), |acc, (entity, plain)| acc.replace(entity, plain))
    }

    fn normalize_line_breaks(&self, html: &str) -> String {
        let flattened = html.replace("\r\n", " ").replace('\n', " ");
        LINE_BREAK.replace_all(&flattened, "\n").into_owned()
    }
}
