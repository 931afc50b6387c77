/// Blog Service Library
///
/// The MediBlog content API: posts, categories, comments, and likes for the
/// hospital blog platform.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Entity structs, request payloads, response shapes
/// - `services`: Business logic layer
/// - `db`: Database access layer and repositories
/// - `cache`: Content caching and invalidation
/// - `middleware`: Bearer-token authentication and request metrics
/// - `routes`: Route configuration
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors and the /metrics endpoint
/// - `text`: Slug and excerpt derivation
/// - `validators`: Allowlist validation for enums and sort fields
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod text;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
