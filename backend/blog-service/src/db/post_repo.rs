use crate::models::{Post, PostWithAuthorRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.content, p.excerpt, p.featured_image, \
     p.author_id, p.tags, p.medical_disclaimer, p.department, p.reading_time, p.status, \
     p.published_at, p.views, p.is_comment_enabled, p.created_at, p.updated_at";

const AUTHOR_COLUMNS: &str = "u.username AS author_username, u.avatar_url AS author_avatar";

/// Filter and paging options for post listings. `sort_column` and
/// `sort_direction` are spliced into the SQL verbatim, so they must come
/// from the validators' allowlists, never from raw user input.
#[derive(Debug, Clone)]
pub struct PostFilter {
    pub status: Option<String>,
    pub category: Option<Uuid>,
    pub author: Option<Uuid>,
    pub search: Option<String>,
    pub sort_column: &'static str,
    pub sort_direction: &'static str,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            status: Some("published".to_string()),
            category: None,
            author: None,
            search: None,
            sort_column: "created_at",
            sort_direction: "DESC",
            limit: 10,
            offset: 0,
        }
    }
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a PostFilter) {
    if let Some(category) = filter.category {
        qb.push(" JOIN post_categories pc ON pc.post_id = p.id AND pc.category_id = ");
        qb.push_bind(category);
    }

    qb.push(" WHERE 1 = 1");

    if let Some(status) = &filter.status {
        qb.push(" AND p.status = ");
        qb.push_bind(status.as_str());
    }

    if let Some(author) = filter.author {
        qb.push(" AND p.author_id = ");
        qb.push_bind(author);
    }

    if let Some(search) = &filter.search {
        qb.push(
            " AND to_tsvector('english', p.title || ' ' || p.content || ' ' || \
             immutable_array_to_string(p.tags, ' ')) @@ plainto_tsquery('english', ",
        );
        qb.push_bind(search.as_str());
        qb.push(")");
    }
}

/// List posts matching the filter, joined with author columns
pub async fn list_posts(
    pool: &PgPool,
    filter: &PostFilter,
) -> Result<Vec<PostWithAuthorRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {POST_COLUMNS}, {AUTHOR_COLUMNS} \
         FROM posts p LEFT JOIN users u ON u.id = p.author_id"
    ));

    push_filters(&mut qb, filter);

    qb.push(" ORDER BY p.")
        .push(filter.sort_column)
        .push(" ")
        .push(filter.sort_direction);
    qb.push(" LIMIT ");
    qb.push_bind(filter.limit);
    qb.push(" OFFSET ");
    qb.push_bind(filter.offset);

    qb.build_query_as::<PostWithAuthorRow>().fetch_all(pool).await
}

/// Count posts matching the filter (ignoring paging)
pub async fn count_posts(pool: &PgPool, filter: &PostFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
    push_filters(&mut qb, filter);

    let (count,) = qb.build_query_as::<(i64,)>().fetch_one(pool).await?;
    Ok(count)
}

/// Every post, newest first, joined with author columns
pub async fn list_all(pool: &PgPool) -> Result<Vec<PostWithAuthorRow>, sqlx::Error> {
    sqlx::query_as::<_, PostWithAuthorRow>(&format!(
        "SELECT {POST_COLUMNS}, {AUTHOR_COLUMNS} \
         FROM posts p LEFT JOIN users u ON u.id = p.author_id \
         ORDER BY p.created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Fetch a post by slug and increment its view counter in the same
/// statement, so concurrent readers never lose a count.
pub async fn find_by_slug_and_bump_views(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<PostWithAuthorRow>, sqlx::Error> {
    sqlx::query_as::<_, PostWithAuthorRow>(
        r#"
        WITH bumped AS (
            UPDATE posts SET views = views + 1
            WHERE slug = $1
            RETURNING id, title, slug, content, excerpt, featured_image, author_id, tags,
                      medical_disclaimer, department, reading_time, status, published_at,
                      views, is_comment_enabled, created_at, updated_at
        )
        SELECT b.id, b.title, b.slug, b.content, b.excerpt, b.featured_image, b.author_id,
               b.tags, b.medical_disclaimer, b.department, b.reading_time, b.status,
               b.published_at, b.views, b.is_comment_enabled, b.created_at, b.updated_at,
               u.username AS author_username, u.avatar_url AS author_avatar
        FROM bumped b
        LEFT JOIN users u ON u.id = b.author_id
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// Find a post by ID
pub async fn find_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, slug, content, excerpt, featured_image, author_id, tags,
               medical_disclaimer, department, reading_time, status, published_at,
               views, is_comment_enabled, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Find a post by ID joined with author columns
pub async fn find_with_author(
    pool: &PgPool,
    post_id: Uuid,
) -> Result<Option<PostWithAuthorRow>, sqlx::Error> {
    sqlx::query_as::<_, PostWithAuthorRow>(&format!(
        "SELECT {POST_COLUMNS}, {AUTHOR_COLUMNS} \
         FROM posts p LEFT JOIN users u ON u.id = p.author_id \
         WHERE p.id = $1"
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Check whether a slug is already taken, optionally excluding one post
/// (so an unchanged title does not collide with itself on update).
pub async fn slug_taken(
    pool: &PgPool,
    slug: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(exclude)
    .fetch_one(pool)
    .await
}

/// Column values for a new post
pub struct NewPost<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub content: &'a str,
    pub excerpt: Option<&'a str>,
    pub featured_image: &'a str,
    pub author_id: Uuid,
    pub tags: &'a [String],
    pub medical_disclaimer: bool,
    pub department: &'a str,
    pub reading_time: i32,
    pub status: &'a str,
    pub is_comment_enabled: bool,
}

/// Insert a post; `published_at` is stamped when it is born published.
pub async fn insert_post(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewPost<'_>,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, slug, content, excerpt, featured_image, author_id, tags,
                           medical_disclaimer, department, reading_time, status,
                           published_at, is_comment_enabled)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                CASE WHEN $11 = 'published' THEN NOW() END, $12)
        RETURNING id, title, slug, content, excerpt, featured_image, author_id, tags,
                  medical_disclaimer, department, reading_time, status, published_at,
                  views, is_comment_enabled, created_at, updated_at
        "#,
    )
    .bind(new.title)
    .bind(new.slug)
    .bind(new.content)
    .bind(new.excerpt)
    .bind(new.featured_image)
    .bind(new.author_id)
    .bind(new.tags)
    .bind(new.medical_disclaimer)
    .bind(new.department)
    .bind(new.reading_time)
    .bind(new.status)
    .bind(new.is_comment_enabled)
    .fetch_one(&mut **tx)
    .await
}

/// Column values for a full post update; `slug: None` keeps the stored slug.
pub struct PostUpdate<'a> {
    pub title: &'a str,
    pub slug: Option<&'a str>,
    pub content: &'a str,
    pub excerpt: Option<&'a str>,
    pub featured_image: &'a str,
    pub tags: &'a [String],
    pub medical_disclaimer: bool,
    pub department: &'a str,
    pub reading_time: i32,
    pub status: &'a str,
    pub is_comment_enabled: bool,
}

/// Apply a full update. `published_at` is stamped exactly once, on the
/// first transition into 'published', and never overwritten afterwards.
pub async fn update_post(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    upd: &PostUpdate<'_>,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = $1,
            slug = COALESCE($2, slug),
            content = $3,
            excerpt = $4,
            featured_image = $5,
            tags = $6,
            medical_disclaimer = $7,
            department = $8,
            reading_time = $9,
            status = $10,
            published_at = CASE WHEN $10 = 'published'
                                THEN COALESCE(published_at, NOW())
                                ELSE published_at END,
            is_comment_enabled = $11,
            updated_at = NOW()
        WHERE id = $12
        RETURNING id, title, slug, content, excerpt, featured_image, author_id, tags,
                  medical_disclaimer, department, reading_time, status, published_at,
                  views, is_comment_enabled, created_at, updated_at
        "#,
    )
    .bind(upd.title)
    .bind(upd.slug)
    .bind(upd.content)
    .bind(upd.excerpt)
    .bind(upd.featured_image)
    .bind(upd.tags)
    .bind(upd.medical_disclaimer)
    .bind(upd.department)
    .bind(upd.reading_time)
    .bind(upd.status)
    .bind(upd.is_comment_enabled)
    .bind(post_id)
    .fetch_one(&mut **tx)
    .await
}

/// Hard-delete a post (likes and category links cascade)
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Replace a post's category links
pub async fn replace_categories(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    category_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    if !category_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO post_categories (post_id, category_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(category_ids)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
