use crate::models::Category;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, color, icon, is_active, created_at, updated_at";

/// Category summary attached to a post id, used for batch population
#[derive(Debug, Clone, FromRow)]
pub struct PostCategoryRow {
    pub post_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// Active categories sorted by name
pub async fn list_active(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active = TRUE ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await
}

/// Find an active category by slug
pub async fn find_active_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1 AND is_active = TRUE"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// Find a category by ID regardless of active flag
pub async fn find_by_id(pool: &PgPool, category_id: Uuid) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(category_id)
    .fetch_optional(pool)
    .await
}

/// Insert a category; a duplicate name surfaces as a unique violation.
pub async fn insert(
    pool: &PgPool,
    name: &str,
    slug: &str,
    description: Option<&str>,
    color: Option<&str>,
    icon: Option<&str>,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (name, slug, description, color, icon) \
         VALUES ($1, $2, $3, COALESCE($4, '#3B82F6'), $5) \
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(color)
    .bind(icon)
    .fetch_one(pool)
    .await
}

/// Update a category's fields
pub async fn update(
    pool: &PgPool,
    category_id: Uuid,
    name: &str,
    slug: &str,
    description: Option<&str>,
    color: Option<&str>,
    icon: Option<&str>,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories \
         SET name = $1, slug = $2, description = $3, color = COALESCE($4, color), \
             icon = $5, updated_at = NOW() \
         WHERE id = $6 \
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(color)
    .bind(icon)
    .bind(category_id)
    .fetch_optional(pool)
    .await
}

/// Soft-delete: flip the active flag off. Returns false when the category
/// does not exist.
pub async fn deactivate(pool: &PgPool, category_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE categories SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
    )
    .bind(category_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Category summaries for a batch of posts (population helper)
pub async fn for_posts(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> Result<Vec<PostCategoryRow>, sqlx::Error> {
    sqlx::query_as::<_, PostCategoryRow>(
        r#"
        SELECT pc.post_id, c.id, c.name, c.slug, c.color
        FROM post_categories pc
        JOIN categories c ON c.id = pc.category_id
        WHERE pc.post_id = ANY($1)
        ORDER BY c.name ASC
        "#,
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await
}
