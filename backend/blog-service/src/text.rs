//! Text derivation helpers for posts and categories.
//!
//! Slugs and excerpts are derived server-side so that every write path
//! produces the same shape regardless of the caller.

use lazy_static::lazy_static;
use regex::Regex;

/// Maximum number of characters kept in an auto-generated excerpt.
pub const EXCERPT_MAX_CHARS: usize = 150;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("static regex must compile");
}

/// Derive a URL-safe slug from a title: lowercase, alphanumeric runs kept,
/// everything else collapsed into single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;

    for c in title.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Strip HTML tags from content and truncate to the excerpt limit,
/// appending an ellipsis only when the text was actually cut.
///
/// Returns `None` when the stripped content is empty, so callers can leave
/// the excerpt column untouched.
pub fn excerpt_from_html(content: &str) -> Option<String> {
    let plain = HTML_TAG.replace_all(content, "");
    let plain = plain.trim();

    if plain.is_empty() {
        return None;
    }

    let chars: Vec<char> = plain.chars().collect();
    if chars.len() > EXCERPT_MAX_CHARS {
        let mut excerpt: String = chars[..EXCERPT_MAX_CHARS].iter().collect();
        excerpt.push_str("...");
        Some(excerpt)
    } else {
        Some(plain.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Heart Health 101"), "heart-health-101");
        assert_eq!(slugify("Flu Season: What To Expect"), "flu-season-what-to-expect");
    }

    #[test]
    fn test_slugify_collapses_separator_runs() {
        assert_eq!(slugify("A  --  B"), "a-b");
        assert_eq!(slugify("...leading and trailing..."), "leading-and-trailing");
    }

    #[test]
    fn test_slugify_empty_when_no_alphanumerics() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_excerpt_short_content_kept_verbatim() {
        let content = "<p>Stay hydrated.</p>";
        assert_eq!(excerpt_from_html(content).as_deref(), Some("Stay hydrated."));
    }

    #[test]
    fn test_excerpt_truncates_at_150_chars_with_ellipsis() {
        let body = "a".repeat(200);
        let content = format!("<article>{}</article>", body);
        let excerpt = excerpt_from_html(&content).unwrap();

        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS + 3);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.starts_with(&"a".repeat(EXCERPT_MAX_CHARS)));
    }

    #[test]
    fn test_excerpt_exactly_150_chars_has_no_ellipsis() {
        let body = "b".repeat(EXCERPT_MAX_CHARS);
        let excerpt = excerpt_from_html(&body).unwrap();
        assert_eq!(excerpt, body);
    }

    #[test]
    fn test_excerpt_empty_after_stripping_tags() {
        assert_eq!(excerpt_from_html("<br/><img src='x'/>"), None);
        assert_eq!(excerpt_from_html("   "), None);
    }
}
