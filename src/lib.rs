pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod services;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    response::Json,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, redis::RedisClient};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: Arc<RedisClient>,
    pub config: Arc<Config>,
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Public routes (no auth required; per-viewer fields fall back to null)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/users/{user_id}", get(handlers::users::get_user_profile))
        .route(
            "/api/users/{user_id}/followers",
            get(handlers::users::get_followers),
        )
        .route(
            "/api/users/{user_id}/following",
            get(handlers::users::get_following),
        )
        .route("/api/categories", get(handlers::categories::get_categories))
        .route("/api/posts", get(handlers::posts::get_posts))
        .route("/api/posts/{post_id}", get(handlers::posts::get_post))
        .route(
            "/api/posts/{post_id}/comments",
            get(handlers::comments::get_post_comments),
        );

    // Protected routes
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        // User routes
        .route("/api/users/me", get(handlers::users::get_current_user))
        .route(
            "/api/users/me/profile",
            put(handlers::users::update_profile),
        )
        .route("/api/users/me/avatar", post(handlers::users::upload_avatar))
        .route(
            "/api/users/{user_id}/subscribe",
            post(handlers::users::subscribe_to_user),
        )
        .route(
            "/api/users/{user_id}/subscribe",
            delete(handlers::users::unsubscribe_from_user),
        )
        // Category routes
        .route(
            "/api/categories",
            post(handlers::categories::create_category),
        )
        .route(
            "/api/categories/{category_id}/subscribe",
            post(handlers::categories::subscribe_to_category),
        )
        .route(
            "/api/categories/{category_id}/subscribe",
            delete(handlers::categories::unsubscribe_from_category),
        )
        // Post routes
        .route("/api/posts", post(handlers::posts::create_post))
        .route("/api/posts/feed", get(handlers::posts::get_feed))
        .route(
            "/api/posts/favorites",
            get(handlers::posts::get_favorite_posts),
        )
        .route("/api/posts/{post_id}", put(handlers::posts::update_post))
        .route("/api/posts/{post_id}", delete(handlers::posts::delete_post))
        .route("/api/posts/{post_id}/like", post(handlers::posts::like_post))
        .route(
            "/api/posts/{post_id}/dislike",
            post(handlers::posts::dislike_post),
        )
        .route(
            "/api/posts/{post_id}/favorite",
            post(handlers::posts::add_favorite),
        )
        .route(
            "/api/posts/{post_id}/favorite",
            delete(handlers::posts::remove_favorite),
        )
        // Comment routes
        .route(
            "/api/posts/{post_id}/comments",
            post(handlers::comments::create_comment),
        )
        .route(
            "/api/comments/{comment_id}",
            put(handlers::comments::update_comment),
        )
        .route(
            "/api/comments/{comment_id}",
            delete(handlers::comments::delete_comment),
        )
        .route(
            "/api/comments/{comment_id}/like",
            post(handlers::comments::like_comment),
        )
        .route(
            "/api/comments/{comment_id}/dislike",
            post(handlers::comments::dislike_comment),
        )
        // Redirect surfaces for rendered pages
        .route("/vote/{post_id}", get(handlers::redirects::vote))
        .route("/favorite/{post_id}", get(handlers::redirects::favorite))
        .route(
            "/subscribe/{object_type}/{object_id}",
            get(handlers::redirects::subscribe),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
