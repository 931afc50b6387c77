use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Category, Post};

/// Redis-backed cache for hot content reads: posts by id and the active
/// category list. Writes and invalidations are fire-and-forget from the
/// caller's perspective; a missing Redis connection disables the cache
/// entirely (used by tests and degraded deployments).
#[derive(Clone)]
pub struct ContentCache {
    redis: Option<ConnectionManager>,
    default_ttl: Duration,
}

impl ContentCache {
    pub fn new(redis: ConnectionManager, default_ttl_secs: u64) -> Self {
        Self {
            redis: Some(redis),
            default_ttl: Duration::from_secs(default_ttl_secs),
        }
    }

    /// Cache that never hits Redis; every read is a miss.
    pub fn disabled() -> Self {
        Self {
            redis: None,
            default_ttl: Duration::from_secs(0),
        }
    }

    fn post_key(post_id: Uuid) -> String {
        format!("blog:post:{}", post_id)
    }

    fn categories_key() -> &'static str {
        "blog:categories:active"
    }

    /// TTL with up to 10% jitter so hot keys do not expire in lockstep.
    fn jittered_ttl(&self) -> u64 {
        let base = self.default_ttl.as_secs();
        let jitter = (rand::random::<u32>() % 10) as u64;
        base + base * jitter / 100
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let Some(redis) = &self.redis else {
            return Ok(None);
        };

        let key = Self::post_key(post_id);
        let mut conn = redis.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(data)) => {
                debug!("post cache HIT for {}", post_id);
                serde_json::from_str::<Post>(&data).map(Some).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            }
            Ok(None) => {
                debug!("post cache MISS for {}", post_id);
                Ok(None)
            }
            Err(e) => {
                warn!("Redis read error for post cache: {}", e);
                Err(AppError::Cache(e))
            }
        }
    }

    pub async fn cache_post(&self, post: &Post) -> Result<()> {
        let Some(redis) = &self.redis else {
            return Ok(());
        };

        let key = Self::post_key(post.id);
        let data = serde_json::to_string(post)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;

        let mut conn = redis.clone();
        conn.set_ex::<_, _, ()>(&key, data, self.jittered_ttl())
            .await
            .map_err(AppError::Cache)?;

        debug!("post cache WRITE for {}", post.id);
        Ok(())
    }

    pub async fn invalidate_post(&self, post_id: Uuid) -> Result<()> {
        let Some(redis) = &self.redis else {
            return Ok(());
        };

        let mut conn = redis.clone();
        conn.del::<_, ()>(Self::post_key(post_id))
            .await
            .map_err(AppError::Cache)?;

        debug!("post cache INVALIDATE for {}", post_id);
        Ok(())
    }

    pub async fn get_categories(&self) -> Result<Option<Vec<Category>>> {
        let Some(redis) = &self.redis else {
            return Ok(None);
        };

        let mut conn = redis.clone();
        match conn
            .get::<_, Option<String>>(Self::categories_key())
            .await
        {
            Ok(Some(data)) => serde_json::from_str::<Vec<Category>>(&data)
                .map(Some)
                .map_err(|e| AppError::Internal(format!("Cache deserialization error: {}", e))),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("Redis read error for category cache: {}", e);
                Err(AppError::Cache(e))
            }
        }
    }

    pub async fn cache_categories(&self, categories: &[Category]) -> Result<()> {
        let Some(redis) = &self.redis else {
            return Ok(());
        };

        let data = serde_json::to_string(categories)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;

        let mut conn = redis.clone();
        conn.set_ex::<_, _, ()>(Self::categories_key(), data, self.jittered_ttl())
            .await
            .map_err(AppError::Cache)?;

        debug!("category cache WRITE ({} entries)", categories.len());
        Ok(())
    }

    pub async fn invalidate_categories(&self) -> Result<()> {
        let Some(redis) = &self.redis else {
            return Ok(());
        };

        let mut conn = redis.clone();
        conn.del::<_, ()>(Self::categories_key())
            .await
            .map_err(AppError::Cache)?;

        debug!("category cache INVALIDATE");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_key_format() {
        let post_id = Uuid::new_v4();
        assert_eq!(
            ContentCache::post_key(post_id),
            format!("blog:post:{}", post_id)
        );
    }

    #[test]
    fn test_categories_key_format() {
        assert_eq!(ContentCache::categories_key(), "blog:categories:active");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_always_a_miss() {
        let cache = ContentCache::disabled();
        let post_id = Uuid::new_v4();

        assert!(cache.get_post(post_id).await.unwrap().is_none());
        assert!(cache.get_categories().await.unwrap().is_none());
        assert!(cache.invalidate_post(post_id).await.is_ok());
        assert!(cache.invalidate_categories().await.is_ok());
    }
}
