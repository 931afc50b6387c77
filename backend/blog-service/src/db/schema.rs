use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

/// Ensure the blog tables and indexes exist.
///
/// Tables are lazily created at service startup to unblock environments
/// where migrations have not been applied yet (fresh developer machines,
/// CI spins).
pub async fn ensure_blog_tables(pool: &PgPool) -> Result<()> {
    info!("Ensuring blog tables exist");

    for statement in [
        USERS_TABLE,
        CATEGORIES_TABLE,
        POSTS_TABLE,
        POST_CATEGORIES_TABLE,
        COMMENTS_TABLE,
        POST_LIKES_TABLE,
        COMMENT_LIKES_TABLE,
        IMMUTABLE_ARRAY_TO_STRING_FN,
        POSTS_STATUS_INDEX,
        POSTS_AUTHOR_INDEX,
        POSTS_FULLTEXT_INDEX,
        COMMENTS_POST_PARENT_INDEX,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username TEXT NOT NULL UNIQUE,
    avatar_url TEXT,
    role TEXT NOT NULL DEFAULT 'patient',
    specialty TEXT,
    license_number TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL UNIQUE,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    color TEXT NOT NULL DEFAULT '#3B82F6',
    icon TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    excerpt TEXT,
    featured_image TEXT NOT NULL DEFAULT '',
    author_id UUID NOT NULL REFERENCES users(id),
    tags TEXT[] NOT NULL DEFAULT '{}',
    medical_disclaimer BOOLEAN NOT NULL DEFAULT TRUE,
    department TEXT NOT NULL DEFAULT 'general',
    reading_time INTEGER NOT NULL DEFAULT 5,
    status TEXT NOT NULL DEFAULT 'draft',
    published_at TIMESTAMPTZ,
    views BIGINT NOT NULL DEFAULT 0,
    is_comment_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const POST_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS post_categories (
    post_id UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    category_id UUID NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    PRIMARY KEY (post_id, category_id)
)
"#;

const COMMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS comments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    content TEXT NOT NULL,
    author_id UUID NOT NULL REFERENCES users(id),
    post_id UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    parent_comment_id UUID REFERENCES comments(id) ON DELETE CASCADE,
    is_approved BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const POST_LIKES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS post_likes (
    post_id UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (post_id, user_id)
)
"#;

const COMMENT_LIKES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS comment_likes (
    comment_id UUID NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (comment_id, user_id)
)
"#;

// array_to_string is only STABLE, which disqualifies it from index
// expressions; the search index needs this IMMUTABLE wrapper.
const IMMUTABLE_ARRAY_TO_STRING_FN: &str = r#"
CREATE OR REPLACE FUNCTION immutable_array_to_string(text[], text)
RETURNS text AS $$ SELECT array_to_string($1, $2) $$
LANGUAGE sql IMMUTABLE
"#;

const POSTS_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_posts_status ON posts (status, created_at DESC)
"#;

const POSTS_AUTHOR_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts (author_id, created_at DESC)
"#;

const POSTS_FULLTEXT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_posts_fulltext ON posts USING GIN (
    to_tsvector('english',
        title || ' ' || content || ' ' || immutable_array_to_string(tags, ' '))
)
"#;

const COMMENTS_POST_PARENT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_comments_post_parent
    ON comments (post_id, parent_comment_id, created_at DESC)
"#;
