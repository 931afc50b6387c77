//! Route configuration
//!
//! Centralized route setup; each domain (posts, categories, comments)
//! manages its own routes. The whole `/api/v1` scope runs behind the
//! bearer-token middleware, which validates presented tokens and leaves
//! anonymous requests to the handlers' `AuthUser` extractor.

use crate::handlers;
use crate::middleware::JwtAuth;
use actix_web::web;

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, auth: &JwtAuth) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(auth.clone())
            .configure(routes::posts::configure)
            .configure(routes::categories::configure)
            .configure(routes::comments::configure),
    );
}

// Sub-modules for each domain
mod routes {
    use super::*;

    pub mod posts {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/posts")
                    .route("/all", web::get().to(handlers::list_all_posts))
                    .service(
                        web::resource("")
                            .route(web::get().to(handlers::list_posts))
                            .route(web::post().to(handlers::create_post)),
                    )
                    .service(
                        web::resource("/post/{id}")
                            .route(web::get().to(handlers::get_post_by_id)),
                    )
                    .service(
                        web::resource("/{id}/like")
                            .route(web::post().to(handlers::toggle_post_like)),
                    )
                    // Slug and id share the single-segment shape, so one
                    // resource carries the GET-by-slug read and the id-keyed
                    // mutations.
                    .service(
                        web::resource("/{slug}")
                            .route(web::get().to(handlers::get_post_by_slug))
                            .route(web::put().to(handlers::update_post))
                            .route(web::delete().to(handlers::delete_post)),
                    ),
            );
        }
    }

    pub mod categories {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/categories")
                    .service(
                        web::resource("")
                            .route(web::get().to(handlers::list_categories))
                            .route(web::post().to(handlers::create_category)),
                    )
                    .service(
                        web::resource("/{slug}")
                            .route(web::get().to(handlers::get_category_by_slug))
                            .route(web::put().to(handlers::update_category))
                            .route(web::delete().to(handlers::delete_category)),
                    ),
            );
        }
    }

    pub mod comments {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/comments")
                    .route("/post/{post_id}", web::get().to(handlers::get_post_comments))
                    .service(
                        web::resource("").route(web::post().to(handlers::create_comment)),
                    )
                    .service(
                        web::resource("/{id}/like")
                            .route(web::post().to(handlers::toggle_comment_like)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(handlers::update_comment))
                            .route(web::delete().to(handlers::delete_comment)),
                    ),
            );
        }
    }
}
