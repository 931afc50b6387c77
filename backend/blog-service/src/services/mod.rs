/// Business logic layer
pub mod categories;
pub mod comments;
pub mod posts;

pub use categories::CategoryService;
pub use comments::CommentService;
pub use posts::PostService;

/// True when the error is a unique-constraint violation, optionally on a
/// specific named constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: Option<&str>) -> bool {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => match constraint {
            Some(name) => db.constraint() == Some(name),
            None => true,
        },
        _ => false,
    }
}

/// True when the error is a foreign-key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
