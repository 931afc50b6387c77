/// HTTP handlers for the blog endpoints
///
/// Handlers stay thin: parse/validate the request, call the service layer,
/// shape the response. All error mapping lives in `AppError`.
pub mod categories;
pub mod comments;
pub mod posts;

use crate::error::{AppError, Result};
use uuid::Uuid;

// Re-export handler functions at module level
pub use categories::{
    create_category, delete_category, get_category_by_slug, list_categories, update_category,
};
pub use comments::{
    create_comment, delete_comment, get_post_comments, toggle_comment_like, update_comment,
};
pub use posts::{
    create_post, delete_post, get_post_by_id, get_post_by_slug, list_all_posts, list_posts,
    toggle_post_like, update_post,
};

/// Parse a path id, rejecting malformed identifiers with a 400 before any
/// lookup happens.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID format", entity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "post").unwrap(), id);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id("not-a-uuid", "post").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid post ID format"));
    }
}
