//! Text helpers shared by the portfolio and blog services
//!
//! - `generate_slug`: URL-friendly slug from a title or name
//! - `slug_or_existing`: slug kept across updates unless replaced
//! - `reading_time`: minutes needed to read an HTML or plain text body

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Average reading speed used for `reading_time`
pub const WORDS_PER_MINUTE: usize = 200;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Generate a URL-friendly slug.
///
/// Accented letters are decomposed (NFKD) and folded to their ASCII base,
/// so "Café" becomes "cafe". Anything else outside ASCII letters, digits,
/// underscores, hyphens and whitespace is dropped, then the remaining words
/// are lowercased and joined with single hyphens. Returns an empty string
/// when nothing survives.
pub fn generate_slug(title: &str) -> String {
    let kept: String = title
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
        .collect();

    SEPARATORS
        .replace_all(kept.trim(), "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

/// Slug for an update: a non-blank new slug wins, otherwise the stored one
/// stays so existing links keep working.
pub fn slug_or_existing(slug: Option<&str>, existing: &str) -> String {
    match slug.map(str::trim) {
        Some(s) if !s.is_empty() => generate_slug(s),
        _ => existing.to_string(),
    }
}

/// Remove HTML tags, keeping the text between them
pub fn strip_tags(content: &str) -> String {
    HTML_TAG.replace_all(content, "").into_owned()
}

/// Count word runs in the text after stripping tags
pub fn word_count(content: &str) -> usize {
    WORD.find_iter(&strip_tags(content)).count()
}

/// Estimated reading time in whole minutes, never below one.
///
/// `words / 200` rounded half to even, so 300 words is 2 minutes and 500
/// words is 2 minutes as well.
pub fn reading_time(content: &str) -> i64 {
    let words = word_count(content);
    let minutes = words / WORDS_PER_MINUTE;
    let remainder = words % WORDS_PER_MINUTE;
    let half = WORDS_PER_MINUTE / 2;

    let rounded = if remainder > half || (remainder == half && minutes % 2 == 1) {
        minutes + 1
    } else {
        minutes
    };

    rounded.max(1) as i64
}
