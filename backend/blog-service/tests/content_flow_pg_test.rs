//! End-to-end content flows against a real PostgreSQL instance.
//!
//! Run with a scratch database:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/mediblog_test cargo test -- --ignored
//! ```

use blog_service::cache::ContentCache;
use blog_service::db::ensure_blog_tables;
use blog_service::middleware::{AuthUser, Role};
use blog_service::models::{CommentInput, PostInput, PostListQuery};
use blog_service::services::{CommentService, PostService};
use blog_service::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

async fn setup() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");

    ensure_blog_tables(&pool).await.expect("schema bootstrap");
    pool
}

fn post_service(pool: &PgPool) -> PostService {
    PostService::new(pool.clone(), Arc::new(ContentCache::disabled()))
}

async fn create_user(pool: &PgPool, role: &str) -> AuthUser {
    let username = format!("user-{}", Uuid::new_v4());
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id",
    )
    .bind(&username)
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("insert test user");

    AuthUser {
        id,
        role: role.parse::<Role>().map_or(Role::Patient, |r| r),
    }
}

fn post_input(title: &str, content: &str, status: &str) -> PostInput {
    PostInput {
        title: title.to_string(),
        content: content.to_string(),
        excerpt: None,
        featured_image: None,
        categories: None,
        tags: None,
        status: Some(status.to_string()),
        is_comment_enabled: None,
        medical_disclaimer: None,
        department: None,
        reading_time: None,
    }
}

#[tokio::test]
#[ignore]
async fn sequential_duplicate_titles_get_numeric_suffixes() {
    let pool = setup().await;
    let author = create_user(&pool, "doctor").await;
    let service = post_service(&pool);

    let title = format!("Hand Hygiene Basics {}", Uuid::new_v4());
    let first = service.create(author.id, &post_input(&title, "<p>one</p>", "draft")).await.unwrap();
    let second = service.create(author.id, &post_input(&title, "<p>two</p>", "draft")).await.unwrap();

    assert_eq!(second.slug, format!("{}-1", first.slug));
}

#[tokio::test]
#[ignore]
async fn excerpt_is_derived_from_stripped_content_when_absent() {
    let pool = setup().await;
    let author = create_user(&pool, "doctor").await;
    let service = post_service(&pool);

    let long_body = "x".repeat(300);
    let title = format!("Excerpt Rules {}", Uuid::new_v4());
    let created = service
        .create(
            author.id,
            &post_input(&title, &format!("<p>{}</p>", long_body), "draft"),
        )
        .await
        .unwrap();

    let excerpt = created.excerpt.unwrap();
    assert_eq!(excerpt.chars().count(), 153);
    assert!(excerpt.ends_with("..."));

    let mut supplied = post_input(
        &format!("Supplied Excerpt {}", Uuid::new_v4()),
        "<p>body</p>",
        "draft",
    );
    supplied.excerpt = Some("hand written".to_string());
    let kept = service.create(author.id, &supplied).await.unwrap();
    assert_eq!(kept.excerpt.as_deref(), Some("hand written"));
}

#[tokio::test]
#[ignore]
async fn published_at_is_stamped_exactly_once() {
    let pool = setup().await;
    let author = create_user(&pool, "doctor").await;
    let service = post_service(&pool);

    let title = format!("Publish Once {}", Uuid::new_v4());
    let draft = service.create(author.id, &post_input(&title, "<p>v1</p>", "draft")).await.unwrap();
    assert!(draft.published_at.is_none());

    let published = service
        .update(draft.id, &author, &post_input(&title, "<p>v2</p>", "published"))
        .await
        .unwrap();
    let stamped = published.published_at.expect("stamped on first publish");

    let touched = service
        .update(draft.id, &author, &post_input(&title, "<p>v3</p>", "published"))
        .await
        .unwrap();
    assert_eq!(touched.published_at, Some(stamped));

    // Archive and republish: the original timestamp survives.
    service
        .update(draft.id, &author, &post_input(&title, "<p>v4</p>", "archived"))
        .await
        .unwrap();
    let republished = service
        .update(draft.id, &author, &post_input(&title, "<p>v5</p>", "published"))
        .await
        .unwrap();
    assert_eq!(republished.published_at, Some(stamped));
}

#[tokio::test]
#[ignore]
async fn like_toggle_pair_returns_to_baseline() {
    let pool = setup().await;
    let author = create_user(&pool, "doctor").await;
    let reader = create_user(&pool, "patient").await;
    let service = post_service(&pool);

    let post = service
        .create(
            author.id,
            &post_input(&format!("Likeable {}", Uuid::new_v4()), "<p>b</p>", "published"),
        )
        .await
        .unwrap();

    let liked = service.toggle_like(post.id, reader.id).await.unwrap();
    assert!(liked.is_liked);
    assert_eq!(liked.likes_count, 1);

    let unliked = service.toggle_like(post.id, reader.id).await.unwrap();
    assert!(!unliked.is_liked);
    assert_eq!(unliked.likes_count, 0);
}

#[tokio::test]
#[ignore]
async fn default_listing_hides_drafts_and_status_all_shows_everything() {
    let pool = setup().await;
    let author = create_user(&pool, "doctor").await;
    let service = post_service(&pool);

    service
        .create(author.id, &post_input(&format!("Draft {}", Uuid::new_v4()), "<p>d</p>", "draft"))
        .await
        .unwrap();
    service
        .create(
            author.id,
            &post_input(&format!("Published {}", Uuid::new_v4()), "<p>p</p>", "published"),
        )
        .await
        .unwrap();

    let default_page = service
        .list(&PostListQuery {
            author: Some(author.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(default_page.total, 1);
    assert!(default_page.posts.iter().all(|p| p.status == "published"));

    let all_page = service
        .list(&PostListQuery {
            author: Some(author.id),
            status: Some("all".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all_page.total, 2);
}

#[tokio::test]
#[ignore]
async fn comment_thread_is_one_level_and_newest_first() {
    let pool = setup().await;
    let author = create_user(&pool, "doctor").await;
    let commenter = create_user(&pool, "patient").await;
    let posts = post_service(&pool);
    let comments = CommentService::new(pool.clone());

    let post = posts
        .create(
            author.id,
            &post_input(&format!("Discussed {}", Uuid::new_v4()), "<p>b</p>", "published"),
        )
        .await
        .unwrap();

    let first_top = comments
        .create(
            &commenter,
            &CommentInput {
                content: "first".to_string(),
                post: post.id,
                parent_comment: None,
            },
        )
        .await
        .unwrap();
    let second_top = comments
        .create(
            &commenter,
            &CommentInput {
                content: "second".to_string(),
                post: post.id,
                parent_comment: None,
            },
        )
        .await
        .unwrap();
    comments
        .create(
            &commenter,
            &CommentInput {
                content: "a reply".to_string(),
                post: post.id,
                parent_comment: Some(first_top.id),
            },
        )
        .await
        .unwrap();

    let page = comments.list_for_post(post.id, None, None).await.unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.comments.len(), 2);
    // Newest-first: the later top-level comment leads and has no replies.
    assert_eq!(page.comments[0].id, second_top.id);
    assert!(page.comments[0].replies.is_empty());
    assert_eq!(page.comments[1].id, first_top.id);
    assert_eq!(page.comments[1].replies.len(), 1);
    assert_eq!(page.comments[1].replies[0].content, "a reply");
}

#[tokio::test]
#[ignore]
async fn non_owner_update_is_denied_and_leaves_the_post_unmodified() {
    let pool = setup().await;
    let author = create_user(&pool, "doctor").await;
    let stranger = create_user(&pool, "nurse").await;
    let service = post_service(&pool);

    let title = format!("Protected {}", Uuid::new_v4());
    let post = service.create(author.id, &post_input(&title, "<p>original</p>", "published")).await.unwrap();

    let err = service
        .update(post.id, &stranger, &post_input(&title, "<p>hijacked</p>", "published"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let unchanged = service.get_by_id(post.id).await.unwrap();
    assert_eq!(unchanged.content, "<p>original</p>");

    // Admins bypass ownership.
    let admin = create_user(&pool, "admin").await;
    let edited = service
        .update(post.id, &admin, &post_input(&title, "<p>moderated</p>", "published"))
        .await
        .unwrap();
    assert_eq!(edited.content, "<p>moderated</p>");
}
