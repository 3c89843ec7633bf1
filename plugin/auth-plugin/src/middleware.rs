//! Authentication Middleware
//!
//! Verifies the bearer access token and stores the resolved user in request
//! extensions for the `AuthUser` extractor.

use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::token::{bearer_token, TokenIssuer, TokenKind};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Require an authenticated user
///
/// Use with `axum::middleware::from_fn_with_state(issuer, require_auth)`.
pub async fn require_auth(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?;

    let claims = issuer.verify(token, TokenKind::Access)?;

    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}
