use sqlx::{PgPool, Row};
use uuid::Uuid;

// ============================================
// Post likes
// ============================================

/// Check if a user has liked a post
pub async fn post_like_exists(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Record a like; the pair primary key rejects duplicates.
pub async fn insert_post_like(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove a like
pub async fn delete_post_like(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Count total likes for a post
pub async fn count_post_likes(pool: &PgPool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
}

/// Like counts for multiple posts in one round trip
pub async fn count_post_likes_batch(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT post_id, COUNT(*) AS count
        FROM post_likes
        WHERE post_id = ANY($1)
        GROUP BY post_id
        "#,
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("post_id"), row.get("count")))
        .collect())
}

// ============================================
// Comment likes
// ============================================

/// Check if a user has liked a comment
pub async fn comment_like_exists(
    pool: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM comment_likes WHERE comment_id = $1 AND user_id = $2)",
    )
    .bind(comment_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Record a comment like; the pair primary key rejects duplicates.
pub async fn insert_comment_like(
    pool: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO comment_likes (comment_id, user_id) VALUES ($1, $2)")
        .bind(comment_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove a comment like
pub async fn delete_comment_like(
    pool: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2")
        .bind(comment_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Count total likes for a comment
pub async fn count_comment_likes(pool: &PgPool, comment_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comment_likes WHERE comment_id = $1")
        .bind(comment_id)
        .fetch_one(pool)
        .await
}

/// Like counts for multiple comments in one round trip
pub async fn count_comment_likes_batch(
    pool: &PgPool,
    comment_ids: &[Uuid],
) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT comment_id, COUNT(*) AS count
        FROM comment_likes
        WHERE comment_id = ANY($1)
        GROUP BY comment_id
        "#,
    )
    .bind(comment_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("comment_id"), row.get("count")))
        .collect())
}
