//! Authentication Error Types
//!
//! Centralized error handling for all authentication operations.
//! Engine failures (database, signing, hashing) carry their detail for the
//! logs only; clients always see a generic internal error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal,
}

impl AuthError {
    /// HTTP status this error translates to
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Persistence(_)
            | AuthError::Signing(_)
            | AuthError::Hashing(_)
            | AuthError::Config(_)
            | AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Collapse engine failures into `Internal`, logging the detail.
    ///
    /// Errors produced intentionally (validation, credentials, tokens) pass through.
    pub fn into_internal(self) -> Self {
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Authentication engine failure");
            AuthError::Internal
        } else {
            self
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message) = match &self {
            AuthError::Validation(msg) => ("validation_error", msg.clone()),
            AuthError::DuplicateEmail => ("duplicate_email", self.to_string()),
            AuthError::InvalidCredentials => ("invalid_credentials", self.to_string()),
            AuthError::TokenExpired => ("token_expired", self.to_string()),
            AuthError::TokenInvalid => ("invalid_token", self.to_string()),
            AuthError::Unauthorized => ("unauthorized", "Authentication required".to_string()),
            AuthError::Persistence(_)
            | AuthError::Signing(_)
            | AuthError::Hashing(_)
            | AuthError::Config(_)
            | AuthError::Internal => {
                if !matches!(self, AuthError::Internal) {
                    tracing::error!(error = %self, "Request failed with internal error");
                }
                ("internal_error", "An internal error occurred".to_string())
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": error_code,
                "message": message
            })),
        )
            .into_response()
    }
}

/// Logged once, when collapsed by `into_internal` or rendered as a response
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Persistence(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{span, subscriber::Interest, Event, Level, Metadata, Subscriber};

    /// Counts ERROR events
    struct ErrorCounter(Arc<AtomicUsize>);

    impl Subscriber for ErrorCounter {
        fn register_callsite(&self, _: &'static Metadata<'static>) -> Interest {
            Interest::sometimes()
        }
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            *metadata.level() == Level::ERROR
        }
        fn new_span(&self, _: &span::Attributes<'_>) -> span::Id {
            span::Id::from_u64(1)
        }
        fn record(&self, _: &span::Id, _: &span::Record<'_>) {}
        fn record_follows_from(&self, _: &span::Id, _: &span::Id) {}
        fn event(&self, _: &Event<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn enter(&self, _: &span::Id) {}
        fn exit(&self, _: &span::Id) {}
    }

    fn error_events(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        tracing::subscriber::with_default(ErrorCounter(count.clone()), f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_database_failure_logged_once() {
        let collapsed = error_events(|| {
            let _ = AuthError::from(sqlx::Error::PoolTimedOut)
                .into_internal()
                .into_response();
        });
        assert_eq!(collapsed, 1);

        let rendered = error_events(|| {
            let _ = AuthError::from(sqlx::Error::PoolTimedOut).into_response();
        });
        assert_eq!(rendered, 1);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Hashing("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_internal_keeps_client_errors() {
        assert_eq!(
            AuthError::InvalidCredentials.into_internal(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::Persistence("connection reset".into()).into_internal(),
            AuthError::Internal
        );
    }

    #[tokio::test]
    async fn test_internal_detail_not_exposed() {
        let response =
            AuthError::Persistence("relation \"users\" does not exist".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal_error");
        assert!(!json["message"].as_str().unwrap().contains("users"));
    }
}
