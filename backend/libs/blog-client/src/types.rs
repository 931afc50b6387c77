//! Wire types for the MediBlog API.
//!
//! Response shapes mirror the server's camelCase JSON; request payloads
//! skip omitted fields so the server's defaults and keep-existing update
//! semantics apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================
// Responses
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// A post with author and categories resolved (list/detail endpoints)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: String,
    pub author: Option<AuthorInfo>,
    pub categories: Vec<CategoryInfo>,
    pub tags: Vec<String>,
    pub medical_disclaimer: bool,
    pub department: String,
    pub reading_time: i32,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub likes_count: i64,
    pub is_comment_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The bare post row (the by-id endpoint returns it unpopulated)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: String,
    pub author_id: Uuid,
    pub tags: Vec<String>,
    pub medical_disclaimer: bool,
    pub department: String,
    pub reading_time: i32,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub is_comment_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPosts {
    pub posts: Vec<Post>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: Uuid,
    pub content: String,
    pub author: Option<AuthorInfo>,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub is_approved: bool,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub replies: Vec<CommentNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentNode>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub message: String,
    pub likes_count: i64,
    pub is_liked: bool,
}

// Mutation envelopes ({"message": ..., "post": ...} and friends)

#[derive(Debug, Clone, Deserialize)]
pub struct PostEnvelope {
    pub message: String,
    pub post: Post,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentEnvelope {
    pub message: String,
    pub comment: CommentNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEnvelope {
    pub message: String,
    pub category: Category,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageOnly {
    pub message: String,
}

// ============================================
// Request payloads
// ============================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_comment_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_disclaimer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub content: String,
    pub post: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

// ============================================
// Query parameters
// ============================================

/// Listing filters. `query_string` renders parameters in one canonical
/// order, so it doubles as the cache-key serialization for the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub category: Option<Uuid>,
    pub author: Option<Uuid>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PostListParams {
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(author) = self.author {
            pairs.push(("author", author.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy", sort_by.clone()));
        }
        if let Some(sort_order) = &self.sort_order {
            pairs.push(("sortOrder", sort_order.clone()));
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Plain page/limit paging (comment listings)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_is_canonical_and_skips_unset() {
        let params = PostListParams {
            page: Some(2),
            limit: Some(10),
            search: Some("flu shots".to_string()),
            sort_by: Some("views".to_string()),
            ..Default::default()
        };

        assert_eq!(
            params.query_string(),
            "page=2&limit=10&search=flu%20shots&sortBy=views"
        );
    }

    #[test]
    fn test_query_string_empty_when_all_unset() {
        assert_eq!(PostListParams::default().query_string(), "");
        assert_eq!(PageParams::default().query_string(), "");
    }

    #[test]
    fn test_equal_params_produce_equal_serializations() {
        let a = PostListParams {
            page: Some(1),
            status: Some("all".to_string()),
            ..Default::default()
        };
        let b = PostListParams {
            page: Some(1),
            status: Some("all".to_string()),
            ..Default::default()
        };

        assert_eq!(a.query_string(), b.query_string());
    }
}
