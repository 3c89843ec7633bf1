//! Shaheed Authentication
//!
//! Authentication core for the Shaheed Q&A backend providing:
//! - User registration and login
//! - Signed access and refresh tokens with a kind claim
//! - Argon2id password hashing
//! - Refresh token rotation with single-use tokens
//!
//! # Configuration
//!
//! All configuration is loaded from environment variables:
//! - `AUTH_SECRET` - Secret key for signing tokens (required, min 32 chars)
//! - `AUTH_EXP` - Access token lifetime in seconds (default: 900)
//! - `AUTH_REFRESH_EXP` - Refresh token lifetime in seconds (default: 604800)
//! - `AUTH_ISSUER` - Token issuer claim (default: "shaheed")
//! - `ARGON2_MEMORY_COST`, `ARGON2_TIME_COST`, `ARGON2_PARALLELISM` - hashing cost
//!
//! # Usage
//!
//! ```rust,ignore
//! use shaheed_auth::{AuthPlugin, Plugin};
//!
//! let plugin = AuthPlugin::new();
//! plugin.activate(db_pool).await?;
//!
//! let auth = plugin.auth_service().await.unwrap();
//! let pair = auth.login(login_request).await?;
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod refresh;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use config::AuthConfig;
pub use credentials::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
pub use error::AuthError;
pub use extractors::AuthUser;
pub use handlers::AuthState;
pub use models::*;
pub use password::PasswordHasher;
pub use refresh::{MemoryRefreshTokenStore, PgRefreshTokenStore, RefreshTokenStore};
pub use service::AuthService;
pub use token::{TokenClaims, TokenIssuer, TokenKind};

use async_trait::async_trait;
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================
// Plugin Types
// ============================================

/// Plugin state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Inactive,
    Active,
}

/// Plugin metadata
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
}

/// Plugin lifecycle trait
#[async_trait]
pub trait Plugin: Send + Sync {
    fn info(&self) -> &PluginInfo;

    async fn state(&self) -> PluginState;

    /// Prepare storage, load configuration and build the service
    async fn activate(&self, db: PgPool) -> Result<(), AuthError>;

    async fn deactivate(&self) -> Result<(), AuthError>;
}

// ============================================
// Auth Plugin Implementation
// ============================================

/// Owns the authentication service for the lifetime of the server
pub struct AuthPlugin {
    info: PluginInfo,
    state: RwLock<PluginState>,
    auth_service: RwLock<Option<Arc<AuthService>>>,
}

impl AuthPlugin {
    pub fn new() -> Self {
        Self {
            info: PluginInfo {
                id: "shaheed-auth".into(),
                name: "Shaheed Authentication".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            state: RwLock::new(PluginState::Inactive),
            auth_service: RwLock::new(None),
        }
    }

    /// Get the authentication service, if activated
    pub async fn auth_service(&self) -> Option<Arc<AuthService>> {
        self.auth_service.read().await.clone()
    }

    /// Install an already-built service, bypassing storage setup
    pub async fn activate_with(&self, auth_service: Arc<AuthService>) {
        *self.auth_service.write().await = Some(auth_service);
        *self.state.write().await = PluginState::Active;
    }

    /// Run database migrations
    async fn run_migrations(&self, db: &PgPool) -> Result<(), AuthError> {
        tracing::info!("Running authentication database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                first_name VARCHAR(100) NOT NULL,
                last_name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(db)
        .await?;

        // One live refresh token per user
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                user_id BIGINT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                token_hash VARCHAR(64) NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(db)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_expires ON refresh_tokens(expires_at);",
        )
        .execute(db)
        .await?;

        tracing::info!("Authentication migrations completed successfully");
        Ok(())
    }
}

impl Default for AuthPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for AuthPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    async fn state(&self) -> PluginState {
        *self.state.read().await
    }

    async fn activate(&self, db: PgPool) -> Result<(), AuthError> {
        tracing::info!("Activating authentication plugin");

        let config = AuthConfig::from_env()?;
        config.validate()?;

        self.run_migrations(&db).await?;

        let auth_service = AuthService::new(
            config,
            Arc::new(PgCredentialStore::new(db.clone())),
            Arc::new(PgRefreshTokenStore::new(db)),
        )?;

        self.activate_with(Arc::new(auth_service)).await;

        tracing::info!("Authentication plugin activated");
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), AuthError> {
        *self.auth_service.write().await = None;
        *self.state.write().await = PluginState::Inactive;

        tracing::info!("Authentication plugin deactivated");
        Ok(())
    }
}

/// Create authentication routes
///
/// Call this after activating the plugin to get the router with all auth endpoints.
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    handlers::create_routes(auth_service)
}
