/// Input validation utilities for the blog API
use validator::ValidationError;

/// Post lifecycle states
pub const POST_STATUSES: &[&str] = &["draft", "published", "archived"];

/// Hospital departments a post can be filed under
pub const DEPARTMENTS: &[&str] = &[
    "general",
    "cardiology",
    "neurology",
    "pediatrics",
    "orthopedics",
    "oncology",
    "emergency",
    "surgery",
    "radiology",
    "pathology",
];

/// Validates a post status value
pub fn is_valid_status(status: &str) -> bool {
    POST_STATUSES.contains(&status)
}

/// Validates a department value
pub fn is_valid_department(department: &str) -> bool {
    DEPARTMENTS.contains(&department)
}

/// Map a requested sort field to its column name.
///
/// Accepts both the wire-format (camelCase) and column (snake_case)
/// spellings; anything else is rejected so user input never reaches the
/// ORDER BY clause as an identifier.
pub fn sort_column(field: &str) -> Option<&'static str> {
    match field {
        "createdAt" | "created_at" => Some("created_at"),
        "publishedAt" | "published_at" => Some("published_at"),
        "readingTime" | "reading_time" => Some("reading_time"),
        "views" => Some("views"),
        "title" => Some("title"),
        _ => None,
    }
}

/// Normalize a sort direction, defaulting to descending
pub fn sort_direction(order: &str) -> &'static str {
    if order.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    }
}

// Custom validators plugged into the `validator` derive on request payloads.

pub fn status_value(status: &str) -> Result<(), ValidationError> {
    if is_valid_status(status) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_status"))
    }
}

pub fn department_value(department: &str) -> Result<(), ValidationError> {
    if is_valid_department(department) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_department"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_statuses() {
        assert!(is_valid_status("draft"));
        assert!(is_valid_status("published"));
        assert!(is_valid_status("archived"));
    }

    #[test]
    fn test_invalid_statuses() {
        assert!(!is_valid_status("all"));
        assert!(!is_valid_status("Published"));
        assert!(!is_valid_status(""));
    }

    #[test]
    fn test_valid_departments() {
        for department in DEPARTMENTS {
            assert!(is_valid_department(department));
        }
    }

    #[test]
    fn test_invalid_departments() {
        assert!(!is_valid_department("dermatology"));
        assert!(!is_valid_department("Cardiology"));
    }

    #[test]
    fn test_sort_column_accepts_both_spellings() {
        assert_eq!(sort_column("createdAt"), Some("created_at"));
        assert_eq!(sort_column("created_at"), Some("created_at"));
        assert_eq!(sort_column("publishedAt"), Some("published_at"));
        assert_eq!(sort_column("views"), Some("views"));
        assert_eq!(sort_column("title"), Some("title"));
        assert_eq!(sort_column("readingTime"), Some("reading_time"));
    }

    #[test]
    fn test_sort_column_rejects_unknown_fields() {
        assert_eq!(sort_column("slug"), None);
        assert_eq!(sort_column("id; DROP TABLE posts"), None);
        assert_eq!(sort_column(""), None);
    }

    #[test]
    fn test_sort_direction_defaults_to_desc() {
        assert_eq!(sort_direction("asc"), "ASC");
        assert_eq!(sort_direction("ASC"), "ASC");
        assert_eq!(sort_direction("desc"), "DESC");
        assert_eq!(sort_direction("sideways"), "DESC");
    }

    #[test]
    fn test_custom_validator_hooks() {
        assert!(status_value("draft").is_ok());
        assert!(status_value("retracted").is_err());
        assert!(department_value("oncology").is_ok());
        assert!(department_value("finance").is_err());
    }
}
