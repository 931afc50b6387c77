/// Post service - slug/excerpt derivation, filtered listing, like toggling
use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::db::post_repo::{self, NewPost, PostFilter, PostUpdate};
use crate::db::{category_repo, like_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{
    AuthorInfo, CategoryInfo, LikeToggleResponse, PaginatedPosts, Post, PostInput, PostListQuery,
    PostResponse, PostWithAuthorRow,
};
use crate::services::{is_foreign_key_violation, is_unique_violation};
use crate::text;
use crate::validators;

/// Bound on slug-derivation retries when concurrent writers race for the
/// same title; each retry re-probes against committed rows.
const MAX_SLUG_ATTEMPTS: u32 = 3;

pub struct PostService {
    pool: PgPool,
    cache: Arc<ContentCache>,
}

impl PostService {
    pub fn new(pool: PgPool, cache: Arc<ContentCache>) -> Self {
        Self { pool, cache }
    }

    // ============================================
    // Reads
    // ============================================

    /// Filtered, paginated listing with author and category population
    pub async fn list(&self, query: &PostListQuery) -> Result<PaginatedPosts> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(10).clamp(1, 100);

        let status = match query.status.as_deref() {
            None => Some("published".to_string()),
            Some("all") => None,
            Some(s) if validators::is_valid_status(s) => Some(s.to_string()),
            Some(s) => {
                return Err(AppError::Validation(format!("invalid status filter: {}", s)));
            }
        };

        let sort_column = match &query.sort_by {
            None => "created_at",
            Some(field) => validators::sort_column(field).ok_or_else(|| {
                AppError::Validation(format!("invalid sortBy field: {}", field))
            })?,
        };
        let sort_direction =
            validators::sort_direction(query.sort_order.as_deref().unwrap_or("desc"));

        let filter = PostFilter {
            status,
            category: query.category,
            author: query.author,
            search: query.search.clone().filter(|s| !s.trim().is_empty()),
            sort_column,
            sort_direction,
            limit,
            offset: (page - 1) * limit,
        };

        let (rows, total) = tokio::try_join!(
            post_repo::list_posts(&self.pool, &filter),
            post_repo::count_posts(&self.pool, &filter)
        )?;

        let posts = self.populate(rows).await?;
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Ok(PaginatedPosts {
            posts,
            total,
            total_pages,
            page,
            limit,
        })
    }

    /// Every post, newest first (dashboard view)
    pub async fn list_all(&self) -> Result<Vec<PostResponse>> {
        let rows = post_repo::list_all(&self.pool).await?;
        self.populate(rows).await
    }

    /// Fetch by slug; bumps the view counter as a side effect.
    pub async fn get_by_slug(&self, slug: &str) -> Result<PostResponse> {
        let row = post_repo::find_by_slug_and_bump_views(&self.pool, slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let mut posts = self.populate(vec![row]).await?;
        posts
            .pop()
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Fetch the bare row by id (no view bump, no population)
    pub async fn get_by_id(&self, post_id: Uuid) -> Result<Post> {
        match self.cache.get_post(post_id).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(err) => tracing::debug!(%post_id, "post cache read failed: {}", err),
        }

        let post = post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if let Err(err) = self.cache.cache_post(&post).await {
            tracing::debug!(%post_id, "post cache set failed: {}", err);
        }

        Ok(post)
    }

    // ============================================
    // Writes
    // ============================================

    /// Create a post, deriving slug and excerpt server-side.
    pub async fn create(&self, author_id: Uuid, input: &PostInput) -> Result<PostResponse> {
        let status = input.status.clone().unwrap_or_else(|| "draft".to_string());
        let excerpt = effective_excerpt(input.excerpt.as_deref(), &input.content);
        let tags = input.tags.clone().unwrap_or_default();
        let category_ids = input.categories.clone().unwrap_or_default();

        let mut attempt = 0;
        loop {
            let slug = self.unique_slug(&input.title, None).await?;

            let mut tx = self.pool.begin().await?;
            let new = NewPost {
                title: &input.title,
                slug: &slug,
                content: &input.content,
                excerpt: excerpt.as_deref(),
                featured_image: input.featured_image.as_deref().unwrap_or(""),
                author_id,
                tags: &tags,
                medical_disclaimer: input.medical_disclaimer.unwrap_or(true),
                department: input.department.as_deref().unwrap_or("general"),
                reading_time: input.reading_time.unwrap_or(5),
                status: &status,
                is_comment_enabled: input.is_comment_enabled.unwrap_or(true),
            };

            let post = match post_repo::insert_post(&mut tx, &new).await {
                Ok(post) => post,
                Err(e) if is_unique_violation(&e, Some("posts_slug_key")) => {
                    attempt += 1;
                    if attempt >= MAX_SLUG_ATTEMPTS {
                        return Err(AppError::Conflict(
                            "Could not derive a unique slug".to_string(),
                        ));
                    }
                    tracing::warn!(title = %input.title, "slug collision on insert, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            link_categories(&mut tx, post.id, &category_ids).await?;
            tx.commit().await?;

            return self.populated_by_id(post.id).await;
        }
    }

    /// Full update; only the owner or an admin may mutate.
    pub async fn update(
        &self,
        post_id: Uuid,
        actor: &AuthUser,
        input: &PostInput,
    ) -> Result<PostResponse> {
        let post = post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.author_id != actor.id && !actor.role.is_admin() {
            return Err(AppError::Authorization("Access denied".to_string()));
        }

        let title_changed = post.title != input.title;
        let status = input.status.clone().unwrap_or_else(|| post.status.clone());
        let excerpt = match &input.excerpt {
            Some(e) if !e.trim().is_empty() => Some(e.clone()),
            _ => post
                .excerpt
                .clone()
                .filter(|e| !e.is_empty())
                .or_else(|| text::excerpt_from_html(&input.content)),
        };
        let tags = input.tags.clone().unwrap_or_else(|| post.tags.clone());

        let mut attempt = 0;
        loop {
            // Slug is recomputed only when the title changed.
            let slug = if title_changed {
                Some(self.unique_slug(&input.title, Some(post_id)).await?)
            } else {
                None
            };

            let mut tx = self.pool.begin().await?;
            let upd = PostUpdate {
                title: &input.title,
                slug: slug.as_deref(),
                content: &input.content,
                excerpt: excerpt.as_deref(),
                featured_image: input
                    .featured_image
                    .as_deref()
                    .unwrap_or(&post.featured_image),
                tags: &tags,
                medical_disclaimer: input.medical_disclaimer.unwrap_or(post.medical_disclaimer),
                department: input.department.as_deref().unwrap_or(&post.department),
                reading_time: input.reading_time.unwrap_or(post.reading_time),
                status: &status,
                is_comment_enabled: input.is_comment_enabled.unwrap_or(post.is_comment_enabled),
            };

            match post_repo::update_post(&mut tx, post_id, &upd).await {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e, Some("posts_slug_key")) => {
                    attempt += 1;
                    if attempt >= MAX_SLUG_ATTEMPTS {
                        return Err(AppError::Conflict(
                            "Could not derive a unique slug".to_string(),
                        ));
                    }
                    tracing::warn!(%post_id, "slug collision on update, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if let Some(category_ids) = &input.categories {
                link_categories(&mut tx, post_id, category_ids).await?;
            }
            tx.commit().await?;

            if let Err(err) = self.cache.invalidate_post(post_id).await {
                tracing::debug!(%post_id, "post cache invalidation failed: {}", err);
            }

            return self.populated_by_id(post_id).await;
        }
    }

    /// Hard-delete; only the owner or an admin may delete.
    pub async fn delete(&self, post_id: Uuid, actor: &AuthUser) -> Result<()> {
        let post = post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.author_id != actor.id && !actor.role.is_admin() {
            return Err(AppError::Authorization("Access denied".to_string()));
        }

        post_repo::delete_post(&self.pool, post_id).await?;

        if let Err(err) = self.cache.invalidate_post(post_id).await {
            tracing::debug!(%post_id, "post cache invalidation failed: {}", err);
        }

        Ok(())
    }

    /// Membership-based like toggle. A concurrent duplicate insert hits the
    /// pair primary key and is treated as already-liked.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggleResponse> {
        post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let was_liked = like_repo::post_like_exists(&self.pool, post_id, user_id).await?;

        if was_liked {
            like_repo::delete_post_like(&self.pool, post_id, user_id).await?;
        } else {
            match like_repo::insert_post_like(&self.pool, post_id, user_id).await {
                Ok(()) => {}
                Err(e) if is_unique_violation(&e, None) => {
                    tracing::debug!(%post_id, %user_id, "duplicate like suppressed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let likes_count = like_repo::count_post_likes(&self.pool, post_id).await?;

        Ok(LikeToggleResponse {
            message: if was_liked {
                "Post unliked".to_string()
            } else {
                "Post liked".to_string()
            },
            likes_count,
            is_liked: !was_liked,
        })
    }

    // ============================================
    // Internals
    // ============================================

    /// Probe for a free slug, appending -1, -2, ... until no collision.
    async fn unique_slug(&self, title: &str, exclude: Option<Uuid>) -> Result<String> {
        let base = {
            let s = text::slugify(title);
            if s.is_empty() {
                "post".to_string()
            } else {
                s
            }
        };

        let mut candidate = base.clone();
        let mut count = 1;
        while post_repo::slug_taken(&self.pool, &candidate, exclude).await? {
            candidate = format!("{}-{}", base, count);
            count += 1;
        }

        Ok(candidate)
    }

    async fn populated_by_id(&self, post_id: Uuid) -> Result<PostResponse> {
        let row = post_repo::find_with_author(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let mut posts = self.populate(vec![row]).await?;
        posts
            .pop()
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Attach categories and like counts to a page of rows in two batched
    /// round trips.
    async fn populate(&self, rows: Vec<PostWithAuthorRow>) -> Result<Vec<PostResponse>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let (category_rows, like_counts) = tokio::try_join!(
            category_repo::for_posts(&self.pool, &ids),
            like_repo::count_post_likes_batch(&self.pool, &ids)
        )?;

        let mut categories_by_post: HashMap<Uuid, Vec<CategoryInfo>> = HashMap::new();
        for row in category_rows {
            categories_by_post
                .entry(row.post_id)
                .or_default()
                .push(CategoryInfo {
                    id: row.id,
                    name: row.name,
                    slug: row.slug,
                    color: row.color,
                });
        }

        let likes_by_post: HashMap<Uuid, i64> = like_counts.into_iter().collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let categories = categories_by_post.remove(&row.id).unwrap_or_default();
                let likes_count = likes_by_post.get(&row.id).copied().unwrap_or(0);
                row_to_response(row, categories, likes_count)
            })
            .collect())
    }
}

fn row_to_response(
    row: PostWithAuthorRow,
    categories: Vec<CategoryInfo>,
    likes_count: i64,
) -> PostResponse {
    let author = row.author_username.map(|username| AuthorInfo {
        id: row.author_id,
        username,
        avatar: row.author_avatar,
    });

    PostResponse {
        id: row.id,
        title: row.title,
        slug: row.slug,
        content: row.content,
        excerpt: row.excerpt,
        featured_image: row.featured_image,
        author,
        categories,
        tags: row.tags,
        medical_disclaimer: row.medical_disclaimer,
        department: row.department,
        reading_time: row.reading_time,
        status: row.status,
        published_at: row.published_at,
        views: row.views,
        likes_count,
        is_comment_enabled: row.is_comment_enabled,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Excerpt precedence: an explicitly supplied excerpt wins; otherwise it is
/// derived from the stripped content.
fn effective_excerpt(supplied: Option<&str>, content: &str) -> Option<String> {
    match supplied {
        Some(e) if !e.trim().is_empty() => Some(e.to_string()),
        _ => text::excerpt_from_html(content),
    }
}

async fn link_categories(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    post_id: Uuid,
    category_ids: &[Uuid],
) -> Result<()> {
    post_repo::replace_categories(tx, post_id, category_ids)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::Validation("Unknown category id".to_string())
            } else {
                e.into()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(title: &str, username: Option<&str>) -> PostWithAuthorRow {
        PostWithAuthorRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: text::slugify(title),
            content: "<p>body</p>".to_string(),
            excerpt: None,
            featured_image: String::new(),
            author_id: Uuid::new_v4(),
            tags: vec![],
            medical_disclaimer: true,
            department: "general".to_string(),
            reading_time: 5,
            status: "published".to_string(),
            published_at: Some(Utc::now()),
            views: 0,
            is_comment_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            author_username: username.map(|u| u.to_string()),
            author_avatar: None,
        }
    }

    #[test]
    fn test_effective_excerpt_prefers_supplied() {
        assert_eq!(
            effective_excerpt(Some("hand-written"), "<p>content</p>").as_deref(),
            Some("hand-written")
        );
    }

    #[test]
    fn test_effective_excerpt_falls_back_to_content() {
        assert_eq!(
            effective_excerpt(None, "<p>content body</p>").as_deref(),
            Some("content body")
        );
        assert_eq!(
            effective_excerpt(Some("   "), "<p>content body</p>").as_deref(),
            Some("content body")
        );
    }

    #[test]
    fn test_row_to_response_maps_author() {
        let with_author = row_to_response(row("A Post", Some("drsmith")), vec![], 3);
        let author = with_author.author.unwrap();
        assert_eq!(author.username, "drsmith");
        assert_eq!(with_author.likes_count, 3);

        let orphan = row_to_response(row("B Post", None), vec![], 0);
        assert!(orphan.author.is_none());
    }
}
