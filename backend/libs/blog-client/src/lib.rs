//! Typed client for the MediBlog API.
//!
//! Wraps reqwest with bearer-token handling and a keyed query cache:
//! reads are cached under a canonical (entity, parameters) key and
//! deduplicated in flight; successful mutations invalidate the affected
//! key families so the next read observes the change. A 401 clears the
//! stored token, empties the cache, and surfaces
//! [`ClientError::AuthRequired`] so the caller can route back to login.

pub mod cache;
pub mod error;
pub mod types;

pub use cache::QueryCache;
pub use error::{ClientError, Result};
pub use types::*;

use cache::keys;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::RwLock;
use uuid::Uuid;

pub struct BlogClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    cache: QueryCache,
}

impl BlogClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api/v1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: RwLock::new(None),
            cache: QueryCache::new(),
        }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Self::new(base_url);
        client.set_token(Some(token.into()));
        client
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().expect("token lock poisoned") = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    // ============================================
    // Posts
    // ============================================

    /// Paginated, filtered post listing (cached per parameter set)
    pub async fn posts(&self, params: &PostListParams) -> Result<PaginatedPosts> {
        let path = match params.query_string().as_str() {
            "" => "/posts".to_string(),
            q => format!("/posts?{}", q),
        };
        self.cache
            .get_or_fetch(&keys::posts_list(params), || self.get_json(path))
            .await
    }

    /// Every post, newest first (cached)
    pub async fn all_posts(&self) -> Result<Vec<Post>> {
        self.cache
            .get_or_fetch(&keys::posts_all(), || self.get_json("/posts/all".to_string()))
            .await
    }

    /// Post detail by slug (cached). The server counts the view on fetch,
    /// so a cache hit intentionally does not add another view.
    pub async fn post(&self, slug: &str) -> Result<Post> {
        self.cache
            .get_or_fetch(&keys::post_by_slug(slug), || {
                self.get_json(format!("/posts/{}", slug))
            })
            .await
    }

    /// Bare post row by id (cached)
    pub async fn post_by_id(&self, id: Uuid) -> Result<PostRecord> {
        self.cache
            .get_or_fetch(&keys::post_by_id(id), || {
                self.get_json(format!("/posts/post/{}", id))
            })
            .await
    }

    pub async fn create_post(&self, payload: &PostPayload) -> Result<Post> {
        let envelope: PostEnvelope = self
            .send(Method::POST, "/posts".to_string(), Some(payload))
            .await?;

        self.cache.invalidate_prefix(keys::POSTS_PREFIX).await;
        Ok(envelope.post)
    }

    pub async fn update_post(&self, id: Uuid, payload: &PostPayload) -> Result<Post> {
        let envelope: PostEnvelope = self
            .send(Method::PUT, format!("/posts/{}", id), Some(payload))
            .await?;

        self.cache.invalidate_prefix(keys::POSTS_PREFIX).await;
        self.cache.invalidate_prefix(keys::POST_DETAIL_PREFIX).await;
        Ok(envelope.post)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<()> {
        let _: MessageOnly = self
            .send::<MessageOnly, ()>(Method::DELETE, format!("/posts/{}", id), None)
            .await?;

        self.cache.invalidate_prefix(keys::POSTS_PREFIX).await;
        self.cache.invalidate_prefix(keys::POST_DETAIL_PREFIX).await;
        Ok(())
    }

    /// Toggle the caller's like on a post
    pub async fn like_post(&self, id: Uuid) -> Result<LikeToggle> {
        let outcome: LikeToggle = self
            .send::<LikeToggle, ()>(Method::POST, format!("/posts/{}/like", id), None)
            .await?;

        // Both the lists and the detail carry the like count.
        self.cache.invalidate_prefix(keys::POSTS_PREFIX).await;
        self.cache.invalidate_prefix(keys::POST_DETAIL_PREFIX).await;
        Ok(outcome)
    }

    // ============================================
    // Categories
    // ============================================

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.cache
            .get_or_fetch(&keys::categories(), || {
                self.get_json("/categories".to_string())
            })
            .await
    }

    pub async fn category(&self, slug: &str) -> Result<Category> {
        self.cache
            .get_or_fetch(&keys::category_by_slug(slug), || {
                self.get_json(format!("/categories/{}", slug))
            })
            .await
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category> {
        let envelope: CategoryEnvelope = self
            .send(Method::POST, "/categories".to_string(), Some(payload))
            .await?;

        self.cache.invalidate_prefix(keys::CATEGORIES_PREFIX).await;
        Ok(envelope.category)
    }

    pub async fn update_category(&self, id: Uuid, payload: &CategoryPayload) -> Result<Category> {
        let envelope: CategoryEnvelope = self
            .send(Method::PUT, format!("/categories/{}", id), Some(payload))
            .await?;

        self.cache.invalidate_prefix(keys::CATEGORIES_PREFIX).await;
        Ok(envelope.category)
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        let _: MessageOnly = self
            .send::<MessageOnly, ()>(Method::DELETE, format!("/categories/{}", id), None)
            .await?;

        self.cache.invalidate_prefix(keys::CATEGORIES_PREFIX).await;
        Ok(())
    }

    // ============================================
    // Comments
    // ============================================

    /// Top-level comments with one level of replies (cached per page)
    pub async fn comments(&self, post_id: Uuid, params: &PageParams) -> Result<CommentPage> {
        let path = match params.query_string().as_str() {
            "" => format!("/comments/post/{}", post_id),
            q => format!("/comments/post/{}?{}", post_id, q),
        };
        self.cache
            .get_or_fetch(&keys::comments_for_post(post_id, params), || {
                self.get_json(path)
            })
            .await
    }

    pub async fn create_comment(&self, payload: &CommentPayload) -> Result<CommentNode> {
        let envelope: CommentEnvelope = self
            .send(Method::POST, "/comments".to_string(), Some(payload))
            .await?;

        // Only the target post's comment pages go stale.
        self.cache
            .invalidate_prefix(&keys::comments_prefix_for_post(payload.post))
            .await;
        Ok(envelope.comment)
    }

    pub async fn update_comment(&self, id: Uuid, content: &str) -> Result<CommentNode> {
        let body = serde_json::json!({ "content": content });
        let envelope: CommentEnvelope = self
            .send(Method::PUT, format!("/comments/{}", id), Some(&body))
            .await?;

        self.cache
            .invalidate_prefix(&keys::comments_prefix_for_post(envelope.comment.post_id))
            .await;
        Ok(envelope.comment)
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<()> {
        let _: MessageOnly = self
            .send::<MessageOnly, ()>(Method::DELETE, format!("/comments/{}", id), None)
            .await?;

        // The response does not say which post the comment belonged to.
        self.cache.invalidate_prefix(keys::COMMENTS_PREFIX).await;
        Ok(())
    }

    pub async fn like_comment(&self, id: Uuid) -> Result<LikeToggle> {
        let outcome: LikeToggle = self
            .send::<LikeToggle, ()>(Method::POST, format!("/comments/{}/like", id), None)
            .await?;

        self.cache.invalidate_prefix(keys::COMMENTS_PREFIX).await;
        Ok(outcome)
    }

    // ============================================
    // Transport
    // ============================================

    async fn get_json<T: DeserializeOwned>(&self, path: String) -> Result<T> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    async fn send<T, B>(&self, method: Method, path: String, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);

        let token = self.token();
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.as_u16() == 401 {
            // Session is over: drop the token and everything cached under it.
            self.set_token(None);
            self.cache.clear().await;
            return Err(ClientError::AuthRequired);
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .and_then(|m| m.as_str())
                        .map(|m| m.to_string())
                })
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });

            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = BlogClient::new("http://localhost:8080/api/v1/");
        assert_eq!(client.base_url, "http://localhost:8080/api/v1");
    }

    #[test]
    fn test_token_lifecycle() {
        let client = BlogClient::with_token("http://localhost:8080/api/v1", "abc");
        assert_eq!(client.token().as_deref(), Some("abc"));

        client.set_token(None);
        assert!(client.token().is_none());
    }
}
