//! Endpoint guard tests: authentication, authorization, input validation,
//! and identifier-format rejection.
//!
//! These run against a lazily-connected pool; every request below is
//! rejected before any query executes, so no database is needed.

use actix_web::{test, web, App};
use blog_service::cache::ContentCache;
use blog_service::middleware::{Claims, JwtAuth};
use blog_service::routes::configure_routes;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use uuid::Uuid;

const SECRET: &str = "integration-test-secret";

fn lazy_pool() -> sqlx::PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/mediblog_guard_tests")
        .expect("lazy pool construction does not touch the network")
}

fn bearer(role: &str) -> String {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Arc::new(ContentCache::disabled())))
                .configure(|cfg| configure_routes(cfg, &JwtAuth::new(SECRET))),
        )
        .await
    };
}

fn valid_post_body() -> Value {
    json!({
        "title": "Flu Season: What To Expect",
        "content": "<p>Wash your hands.</p>"
    })
}

#[actix_web::test]
async fn create_post_without_token_is_unauthorized() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .set_json(valid_post_body())
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_web::test]
async fn create_post_with_invalid_token_is_unauthorized() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", "Bearer not-a-real-token"))
        .set_json(valid_post_body())
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_web::test]
async fn invalid_token_is_rejected_even_on_public_reads() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", "Bearer garbage"))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_web::test]
async fn create_post_with_overlong_title_is_rejected() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", bearer("doctor")))
        .set_json(json!({
            "title": "t".repeat(201),
            "content": "<p>body</p>"
        }))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn create_post_with_unknown_department_is_rejected() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", bearer("doctor")))
        .set_json(json!({
            "title": "A Title",
            "content": "<p>body</p>",
            "department": "astrology"
        }))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
async fn get_post_by_malformed_id_is_a_format_error() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/post/not-a-uuid")
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Invalid post ID format");
}

#[actix_web::test]
async fn update_post_without_token_is_unauthorized() {
    let app = test_app!();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{}", Uuid::new_v4()))
        .set_json(valid_post_body())
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_web::test]
async fn update_comment_with_malformed_id_is_a_format_error() {
    let app = test_app!();

    let req = test::TestRequest::put()
        .uri("/api/v1/comments/definitely-not-a-uuid")
        .insert_header(("Authorization", bearer("patient")))
        .set_json(json!({"content": "edited"}))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Invalid comment ID format");
}

#[actix_web::test]
async fn category_create_requires_admin() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/categories")
        .insert_header(("Authorization", bearer("doctor")))
        .set_json(json!({"name": "Cardiology"}))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 403);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "AUTHORIZATION_ERROR");
}

#[actix_web::test]
async fn category_create_without_token_is_unauthorized() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/categories")
        .set_json(json!({"name": "Cardiology"}))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}

#[actix_web::test]
async fn category_delete_requires_admin_before_id_parsing() {
    let app = test_app!();

    // Role is checked first, so even a malformed id yields 403 here.
    let req = test::TestRequest::delete()
        .uri("/api/v1/categories/not-an-id")
        .insert_header(("Authorization", bearer("nurse")))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 403);
}

#[actix_web::test]
async fn comment_with_overlong_content_is_rejected() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/comments")
        .insert_header(("Authorization", bearer("patient")))
        .set_json(json!({
            "content": "c".repeat(1001),
            "post": Uuid::new_v4()
        }))
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
async fn expired_token_is_unauthorized() {
    let app = test_app!();

    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: "doctor".to_string(),
        exp: (chrono::Utc::now().timestamp() - 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(valid_post_body())
        .to_request();

    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 401);
}
