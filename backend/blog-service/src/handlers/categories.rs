/// Category handlers - HTTP endpoints for category operations
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

use crate::cache::ContentCache;
use crate::error::Result;
use crate::handlers::parse_id;
use crate::middleware::{require_admin, AuthUser};
use crate::models::CategoryInput;
use crate::services::CategoryService;

fn service(pool: &web::Data<PgPool>, cache: &web::Data<Arc<ContentCache>>) -> CategoryService {
    CategoryService::new(pool.get_ref().clone(), cache.get_ref().clone())
}

/// Get all active categories
/// GET /api/v1/categories
pub async fn list_categories(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
) -> Result<HttpResponse> {
    let categories = service(&pool, &cache).list_active().await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// Get a single active category by slug
/// GET /api/v1/categories/{slug}
pub async fn get_category_by_slug(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let category = service(&pool, &cache).get_by_slug(&path).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// Create a category (admin only)
/// POST /api/v1/categories
pub async fn create_category(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    user: AuthUser,
    body: web::Json<CategoryInput>,
) -> Result<HttpResponse> {
    require_admin(&user)?;
    body.validate()?;

    let category = service(&pool, &cache).create(&body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Category created successfully",
        "category": category,
    })))
}

/// Update a category (admin only)
/// PUT /api/v1/categories/{id}
pub async fn update_category(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CategoryInput>,
) -> Result<HttpResponse> {
    require_admin(&user)?;
    let category_id = parse_id(&path, "category")?;
    body.validate()?;

    let category = service(&pool, &cache).update(category_id, &body).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Category updated successfully",
        "category": category,
    })))
}

/// Soft-delete a category (admin only)
/// DELETE /api/v1/categories/{id}
pub async fn delete_category(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ContentCache>>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    require_admin(&user)?;
    let category_id = parse_id(&path, "category")?;

    service(&pool, &cache).delete(category_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Category deleted successfully",
    })))
}
