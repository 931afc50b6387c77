//! Data models for the blog service
//!
//! Entity structs map 1:1 onto table rows (`sqlx::FromRow`); the
//! `*Response` structs are the wire shapes with authors and categories
//! resolved. JSON uses camelCase to match the public API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// ============================================
// Entities
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author columns selected alongside content rows (username + avatar only)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

// ============================================
// Joined rows
// ============================================

/// Post row joined with its author's public fields
#[derive(Debug, Clone, FromRow)]
pub struct PostWithAuthorRow {
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
    pub author_username: Option<String>,
    pub author_avatar: Option<String>,
}

/// Comment row joined with its author's public fields
#[derive(Debug, Clone, FromRow)]
pub struct CommentWithAuthorRow {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_username: Option<String>,
    pub author_avatar: Option<String>,
}

// ============================================
// Response shapes
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPosts {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub author: Option<AuthorInfo>,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub is_approved: bool,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Direct replies only; replies are never nested further.
    pub replies: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentResponse>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub message: String,
    pub likes_count: i64,
    pub is_liked: bool,
}

// ============================================
// Request payloads
// ============================================

/// Body for creating or fully updating a post
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[validate(length(max = 300, message = "excerpt must be at most 300 characters"))]
    pub excerpt: Option<String>,
    #[validate(url(message = "featuredImage must be a valid URL"))]
    pub featured_image: Option<String>,
    /// Omitted on update means "keep the existing links"
    pub categories: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = crate::validators::status_value))]
    pub status: Option<String>,
    pub is_comment_enabled: Option<bool>,
    pub medical_disclaimer: Option<bool>,
    #[validate(custom(function = crate::validators::department_value))]
    pub department: Option<String>,
    #[validate(range(min = 1, message = "readingTime must be at least 1"))]
    pub reading_time: Option<i32>,
}

/// Body for creating a comment
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    #[validate(length(min = 1, max = 1000, message = "content must be 1-1000 characters"))]
    pub content: String,
    pub post: Uuid,
    pub parent_comment: Option<Uuid>,
}

/// Body for editing a comment
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpdateInput {
    #[validate(length(min = 1, max = 1000, message = "content must be 1-1000 characters"))]
    pub content: String,
}

/// Body for creating or updating a category
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

// ============================================
// Query parameters
// ============================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub category: Option<Uuid>,
    pub author: Option<Uuid>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
