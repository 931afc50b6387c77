/// Content caching and invalidation
pub mod content_cache;

pub use content_cache::ContentCache;
