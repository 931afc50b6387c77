/// Database access layer
///
/// Repository modules hold the SQL for each entity; `schema` creates the
/// tables and indexes at startup.
pub mod category_repo;
pub mod comment_repo;
pub mod like_repo;
pub mod post_repo;
pub mod schema;
pub mod user_repo;

pub use schema::ensure_blog_tables;
