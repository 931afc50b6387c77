//! Keyed query cache with explicit invalidation.
//!
//! Every read is stored under a canonical key of (entity kind, parameters).
//! Mutations invalidate key families by prefix, so the next read refetches.
//! Concurrent fetches for the same key are deduplicated: one caller does
//! the network round trip while the rest wait and read the cached value.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::Result;

#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, Value>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or run `fetch` and cache its
    /// result. Only one in-flight fetch per key; latecomers wait on the
    /// key lock and then read what the winner stored.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.entries.read().await.get(key) {
            debug!(key, "query cache HIT");
            return Ok(serde_json::from_value(value.clone())?);
        }

        let key_lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = key_lock.lock().await;

        // A concurrent caller may have filled the entry while we waited.
        if let Some(value) = self.entries.read().await.get(key) {
            debug!(key, "query cache HIT after wait");
            return Ok(serde_json::from_value(value.clone())?);
        }

        debug!(key, "query cache MISS");
        let fetched = fetch().await?;

        self.entries
            .write()
            .await
            .insert(key.to_string(), serde_json::to_value(&fetched)?);

        Ok(fetched)
    }

    /// Drop every entry whose key starts with `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        debug!(prefix, dropped = before - entries.len(), "query cache invalidated");
    }

    /// Drop everything (used on session clear).
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

/// Canonical cache keys per entity family. Families share a prefix so a
/// single invalidation call covers list and detail variants.
pub mod keys {
    use crate::types::{PageParams, PostListParams};
    use uuid::Uuid;

    pub const POSTS_PREFIX: &str = "posts";
    pub const POST_DETAIL_PREFIX: &str = "post:";
    pub const CATEGORIES_PREFIX: &str = "categories";
    pub const COMMENTS_PREFIX: &str = "comments:";

    pub fn posts_list(params: &PostListParams) -> String {
        format!("posts?{}", params.query_string())
    }

    pub fn posts_all() -> String {
        "posts?view=all".to_string()
    }

    pub fn post_by_slug(slug: &str) -> String {
        format!("post:slug:{}", slug)
    }

    pub fn post_by_id(id: Uuid) -> String {
        format!("post:id:{}", id)
    }

    pub fn categories() -> String {
        "categories".to_string()
    }

    pub fn category_by_slug(slug: &str) -> String {
        format!("categories:{}", slug)
    }

    pub fn comments_for_post(post_id: Uuid, params: &PageParams) -> String {
        format!("comments:{}?{}", post_id, params.query_string())
    }

    pub fn comments_prefix_for_post(post_id: Uuid) -> String {
        format!("comments:{}", post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        let first: i64 = cache
            .get_or_fetch("posts?page=1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(41)
            })
            .await
            .unwrap();
        let second: i64 = cache
            .get_or_fetch("posts?page=1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(99)
            })
            .await
            .unwrap();

        assert_eq!(first, 41);
        assert_eq!(second, 41);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_for_one_key_are_deduplicated() {
        let cache = Arc::new(QueryCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetch = |cache: Arc<QueryCache>, calls: Arc<AtomicUsize>| async move {
            cache
                .get_or_fetch("posts?page=1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(25)).await;
                    Ok(7_i64)
                })
                .await
        };

        let (a, b) = tokio::join!(
            slow_fetch(cache.clone(), calls.clone()),
            slow_fetch(cache.clone(), calls.clone())
        );

        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_prefix_only_drops_the_family() {
        let cache = QueryCache::new();

        cache
            .get_or_fetch("posts?page=1", || async { Ok(1_i64) })
            .await
            .unwrap();
        cache
            .get_or_fetch("post:slug:flu-season", || async { Ok(2_i64) })
            .await
            .unwrap();
        cache
            .get_or_fetch("categories", || async { Ok(3_i64) })
            .await
            .unwrap();

        cache.invalidate_prefix("posts").await;

        assert!(!cache.contains("posts?page=1").await);
        assert!(cache.contains("post:slug:flu-season").await);
        assert!(cache.contains("categories").await);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        let failed: Result<i64> = cache
            .get_or_fetch("posts?page=1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(crate::error::ClientError::Api {
                    status: 500,
                    message: "Server error".to_string(),
                })
            })
            .await;
        assert!(failed.is_err());

        let retried: i64 = cache
            .get_or_fetch("posts?page=1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            })
            .await
            .unwrap();

        assert_eq!(retried, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
