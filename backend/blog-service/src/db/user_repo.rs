use crate::models::UserSummary;
use sqlx::PgPool;
use uuid::Uuid;

/// Public author fields for response population
pub async fn find_summary(pool: &PgPool, user_id: Uuid) -> Result<Option<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, username, avatar_url FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
