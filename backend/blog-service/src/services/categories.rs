/// Category service - active listing with caching, admin CRUD, soft delete
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::db::category_repo;
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryInput};
use crate::services::is_unique_violation;
use crate::text;

pub struct CategoryService {
    pool: PgPool,
    cache: Arc<ContentCache>,
}

impl CategoryService {
    pub fn new(pool: PgPool, cache: Arc<ContentCache>) -> Self {
        Self { pool, cache }
    }

    /// Active categories, name-ascending, served from cache when possible.
    pub async fn list_active(&self) -> Result<Vec<Category>> {
        match self.cache.get_categories().await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(err) => tracing::debug!("category cache read failed: {}", err),
        }

        let categories = category_repo::list_active(&self.pool).await?;

        if let Err(err) = self.cache.cache_categories(&categories).await {
            tracing::debug!("category cache set failed: {}", err);
        }

        Ok(categories)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category> {
        category_repo::find_active_by_slug(&self.pool, slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn create(&self, input: &CategoryInput) -> Result<Category> {
        let slug = derived_slug(&input.name);

        let category = category_repo::insert(
            &self.pool,
            &input.name,
            &slug,
            input.description.as_deref(),
            input.color.as_deref(),
            input.icon.as_deref(),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e, None) {
                AppError::Conflict("Category name already exists".to_string())
            } else {
                e.into()
            }
        })?;

        self.invalidate_cache().await;
        Ok(category)
    }

    pub async fn update(&self, category_id: Uuid, input: &CategoryInput) -> Result<Category> {
        let slug = derived_slug(&input.name);

        let category = category_repo::update(
            &self.pool,
            category_id,
            &input.name,
            &slug,
            input.description.as_deref(),
            input.color.as_deref(),
            input.icon.as_deref(),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e, None) {
                AppError::Conflict("Category name already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        self.invalidate_cache().await;
        Ok(category)
    }

    /// Soft delete: categories are deactivated, never removed, so existing
    /// post links stay intact.
    pub async fn delete(&self, category_id: Uuid) -> Result<()> {
        let existed = category_repo::deactivate(&self.pool, category_id).await?;
        if !existed {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        self.invalidate_cache().await;
        Ok(())
    }

    async fn invalidate_cache(&self) {
        if let Err(err) = self.cache.invalidate_categories().await {
            tracing::debug!("category cache invalidation failed: {}", err);
        }
    }
}

fn derived_slug(name: &str) -> String {
    let slug = text::slugify(name);
    if slug.is_empty() {
        "category".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_slug() {
        assert_eq!(derived_slug("Heart Health"), "heart-health");
        assert_eq!(derived_slug("ICU & ER"), "icu-er");
        assert_eq!(derived_slug("!!!"), "category");
    }
}
