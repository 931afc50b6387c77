use crate::models::{Comment, CommentWithAuthorRow};
use sqlx::PgPool;
use uuid::Uuid;

const COMMENT_COLUMNS: &str =
    "c.id, c.content, c.author_id, c.post_id, c.parent_comment_id, c.is_approved, \
     c.created_at, c.updated_at";

const AUTHOR_COLUMNS: &str = "u.username AS author_username, u.avatar_url AS author_avatar";

/// Create a new comment on a post
pub async fn insert(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
    parent_comment_id: Option<Uuid>,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (post_id, author_id, content, parent_comment_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, content, author_id, post_id, parent_comment_id, is_approved,
                  created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .bind(parent_comment_id)
    .fetch_one(pool)
    .await
}

/// Get a single comment by ID
pub async fn find_by_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, content, author_id, post_id, parent_comment_id, is_approved,
               created_at, updated_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Update comment content
pub async fn update_content(
    pool: &PgPool,
    comment_id: Uuid,
    content: &str,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        UPDATE comments
        SET content = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, content, author_id, post_id, parent_comment_id, is_approved,
                  created_at, updated_at
        "#,
    )
    .bind(content)
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Hard-delete a comment (its replies and likes cascade)
pub async fn delete(pool: &PgPool, comment_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Approved top-level comments for a post, newest first
pub async fn top_level_for_post(
    pool: &PgPool,
    post_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentWithAuthorRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentWithAuthorRow>(&format!(
        "SELECT {COMMENT_COLUMNS}, {AUTHOR_COLUMNS} \
         FROM comments c LEFT JOIN users u ON u.id = c.author_id \
         WHERE c.post_id = $1 AND c.parent_comment_id IS NULL AND c.is_approved = TRUE \
         ORDER BY c.created_at DESC \
         LIMIT $2 OFFSET $3"
    ))
    .bind(post_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Count approved top-level comments for a post
pub async fn count_top_level(pool: &PgPool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM comments \
         WHERE post_id = $1 AND parent_comment_id IS NULL AND is_approved = TRUE",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await
}

/// Direct replies for a batch of parent comments, oldest first.
/// Strictly one level: replies to replies are never fetched here.
pub async fn replies_for(
    pool: &PgPool,
    parent_ids: &[Uuid],
) -> Result<Vec<CommentWithAuthorRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentWithAuthorRow>(&format!(
        "SELECT {COMMENT_COLUMNS}, {AUTHOR_COLUMNS} \
         FROM comments c LEFT JOIN users u ON u.id = c.author_id \
         WHERE c.parent_comment_id = ANY($1) AND c.is_approved = TRUE \
         ORDER BY c.created_at ASC"
    ))
    .bind(parent_ids)
    .fetch_all(pool)
    .await
}
