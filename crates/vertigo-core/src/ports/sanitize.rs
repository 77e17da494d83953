/// HTML clean-up used when deriving plain text from post content.
pub trait Sanitizer: Send + Sync {
    /// Remove every tag, leaving plain text.
    fn strip_tags(&self, html: &str) -> String;

    /// Collapse `<br>` and `</p>` variants into newlines.
    fn normalize_line_breaks(&self, html: &str) -> String;
}
