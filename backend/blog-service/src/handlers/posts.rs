/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

use crate::cache::ContentCache;
use crate::error::Result;
use crate::handlers::parse_id;
use crate::middleware::AuthUser;
use crate::models::{PostInput, PostListQuery};
use crate::services::PostService;

fn service(pool: &web::Data<PgPool>, cache: &web::Data<Arc<ContentCache>>) -> PostService {
    PostService::new(pool.get_ref().clone(), cache.get_ref().clone())
}

/// Get posts with pagination and filtering
/// GET /api/v1/posts
pub async fn list_posts(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse> {
    let page = service(&pool, &cache).list(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Get every post, newest first (dashboard view)
/// GET /api/v1/posts/all
pub async fn list_all_posts(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
) -> Result<HttpResponse> {
    let posts = service(&pool, &cache).list_all().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Get a single post by slug; increments the view counter.
/// GET /api/v1/posts/{slug}
pub async fn get_post_by_slug(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post = service(&pool, &cache).get_by_slug(&path).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Get a single post by id (no view increment)
/// GET /api/v1/posts/post/{id}
pub async fn get_post_by_id(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "post")?;
    let post = service(&pool, &cache).get_by_id(post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Create a new post
/// POST /api/v1/posts
pub async fn create_post(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    user: AuthUser,
    body: web::Json<PostInput>,
) -> Result<HttpResponse> {
    body.validate()?;

    let post = service(&pool, &cache).create(user.id, &body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Post created successfully",
        "post": post,
    })))
}

/// Update a post (owner or admin)
/// PUT /api/v1/posts/{id}
pub async fn update_post(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<PostInput>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "post")?;
    body.validate()?;

    let post = service(&pool, &cache).update(post_id, &user, &body).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post updated successfully",
        "post": post,
    })))
}

/// Delete a post (owner or admin)
/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "post")?;

    service(&pool, &cache).delete(post_id, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted successfully",
    })))
}

/// Like or unlike a post, depending on current membership
/// POST /api/v1/posts/{id}/like
pub async fn toggle_post_like(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "post")?;
    let outcome = service(&pool, &cache).toggle_like(post_id, user.id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
