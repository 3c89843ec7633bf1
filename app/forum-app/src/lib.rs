//! Shaheed Forum API
//!
//! Q&A forum backend: questions and replies behind the Shaheed
//! authentication routes, with optional content moderation.

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod moderation;
pub mod services;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use shaheed_auth::{middleware::require_auth, AuthService};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Aggregated services container
pub struct ForumServices {
    pub env: String,
    pub questions: services::QuestionService,
    pub auth: Arc<AuthService>,
}

/// Build the full application router
pub fn create_router(services: Arc<ForumServices>) -> Router {
    // Public routes
    let public = Router::new()
        .route("/questions", get(handlers::questions::list_questions))
        .route("/questions/:id", get(handlers::questions::get_question))
        .route("/questions/:id/replies", get(handlers::questions::list_replies));

    // Protected routes (require an access token)
    let protected = Router::new()
        .route("/questions", post(handlers::questions::create_question))
        .route(
            "/questions/:id",
            put(handlers::questions::update_question).delete(handlers::questions::delete_question),
        )
        .layer(axum_middleware::from_fn_with_state(
            services.auth.issuer(),
            require_auth,
        ));

    let v1 = Router::new()
        .merge(public)
        .merge(protected)
        .with_state(services.clone())
        .merge(shaheed_auth::create_routes(services.auth.clone()));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .with_state(services)
        .nest("/v1", v1)
}

/// CORS policy: any http(s) origin, no credentials
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| o.starts_with("http://") || o.starts_with("https://"))
                .unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::list([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ]))
        .expose_headers([header::LINK])
        .max_age(Duration::from_secs(300))
}
