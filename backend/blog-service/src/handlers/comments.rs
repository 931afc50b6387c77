/// Comment handlers - HTTP endpoints for comment operations
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::error::Result;
use crate::handlers::parse_id;
use crate::middleware::AuthUser;
use crate::models::{CommentInput, CommentUpdateInput, PageQuery};
use crate::services::CommentService;

fn service(pool: &web::Data<PgPool>) -> CommentService {
    CommentService::new(pool.get_ref().clone())
}

/// Get paginated top-level comments (with one level of replies) for a post
/// GET /api/v1/comments/post/{postId}
pub async fn get_post_comments(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "post")?;

    let page = service(&pool)
        .list_for_post(post_id, query.page, query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Create a comment (comments must be enabled on the target post)
/// POST /api/v1/comments
pub async fn create_comment(
    pool: web::Data<PgPool>,
    user: AuthUser,
    body: web::Json<CommentInput>,
) -> Result<HttpResponse> {
    body.validate()?;

    let comment = service(&pool).create(&user, &body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Comment created successfully",
        "comment": comment,
    })))
}

/// Edit a comment (author only)
/// PUT /api/v1/comments/{id}
pub async fn update_comment(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CommentUpdateInput>,
) -> Result<HttpResponse> {
    let comment_id = parse_id(&path, "comment")?;
    body.validate()?;

    let comment = service(&pool)
        .update(comment_id, &user, &body.content)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment updated successfully",
        "comment": comment,
    })))
}

/// Delete a comment (author or admin)
/// DELETE /api/v1/comments/{id}
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let comment_id = parse_id(&path, "comment")?;

    service(&pool).delete(comment_id, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment deleted successfully",
    })))
}

/// Like or unlike a comment, depending on current membership
/// POST /api/v1/comments/{id}/like
pub async fn toggle_comment_like(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let comment_id = parse_id(&path, "comment")?;
    let outcome = service(&pool).toggle_like(comment_id, user.id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
