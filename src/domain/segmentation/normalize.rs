use html2text::from_read;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("url pattern"));
static WHITESPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Reduce entry text to what should be spoken: markup stripped, URLs
/// removed, whitespace collapsed to single spaces.
pub fn normalize_text(text: &str) -> String {
    let plain_text = if text.contains('<') {
        from_read(text.as_bytes(), usize::MAX)
    } else {
        text.to_string()
    };

    let without_urls = URL_PATTERN.replace_all(&plain_text, "");
    let normalized = WHITESPACE_PATTERN.replace_all(&without_urls, " ");

    normalized.trim().to_string()
}
