//! Authentication HTTP Handlers
//!
//! REST API endpoints for authentication operations.

use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::middleware;
use crate::models::*;
use crate::service::AuthService;
use crate::token::bearer_token;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    // Public routes (no authentication required)
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh_token).get(refresh_bearer));

    // Protected routes (require an access token)
    let protected = Router::new()
        .route("/auth/me", get(get_current_user))
        .layer(axum_middleware::from_fn_with_state(
            auth_service.issuer(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(auth_service)
}

// ============================================
// Registration
// ============================================

/// POST /auth/register
///
/// Register a new user account
pub async fn register(
    State(auth): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Registration successful",
            "user": UserResponse::from(user),
        })),
    ))
}

// ============================================
// Login / Logout
// ============================================

/// POST /auth/login
///
/// Authenticate user and return access/refresh tokens
pub async fn login(
    State(auth): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = auth.login(req).await?;

    Ok(Json(response))
}

/// POST /auth/logout
pub async fn logout(
    State(auth): State<AuthState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    auth.logout(&req.refresh_token).await?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

// ============================================
// Token Refresh
// ============================================

/// POST /auth/refresh
///
/// Rotate the refresh token given in the body
pub async fn refresh_token(
    State(auth): State<AuthState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    req.validate()?;

    let response = auth.refresh(&req.refresh_token).await?;

    Ok(Json(response))
}

/// GET /auth/refresh
///
/// Rotate the refresh token carried as a bearer token
pub async fn refresh_bearer(
    State(auth): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let token = bearer_token(&headers)?;

    let response = auth.refresh(token).await?;

    Ok(Json(response))
}

// ============================================
// User Profile
// ============================================

/// GET /auth/me
pub async fn get_current_user(
    State(auth): State<AuthState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AuthError> {
    let user = auth.current_user(user.id).await?;

    Ok(Json(serde_json::json!({
        "user": UserResponse::from(user)
    })))
}
