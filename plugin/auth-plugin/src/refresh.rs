//! Refresh Token Store
//!
//! One stored refresh token per user, kept as a SHA-256 digest. Rotation is a
//! single conditional write on that digest: whoever swaps it first wins, and
//! any later attempt with the same token finds a different digest on file.

use crate::error::AuthError;
use crate::models::TokenPair;
use crate::token::{TokenIssuer, TokenKind};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Record `token_hash` as the user's current refresh token, superseding any other
    async fn store(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Replace the record only if it still holds `presented_hash` and has not expired
    async fn swap(
        &self,
        user_id: i64,
        presented_hash: &str,
        replacement_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError>;

    /// Drop the user's refresh token if it is still `token_hash`
    async fn revoke(&self, user_id: i64, token_hash: &str) -> Result<bool, AuthError>;
}

/// Digest used for storage; raw refresh tokens are never persisted
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Exchange a refresh token for a new access/refresh pair
///
/// The presented token must be a valid refresh token for `user_id` and match
/// the record on file. On success the old token is no longer accepted.
pub async fn rotate(
    store: &dyn RefreshTokenStore,
    issuer: &TokenIssuer,
    user_id: i64,
    presented: &str,
    refresh_ttl: Duration,
    access_ttl: Duration,
) -> Result<TokenPair, AuthError> {
    let claims = issuer.verify(presented, TokenKind::Refresh)?;
    if claims.sub != user_id {
        return Err(AuthError::TokenInvalid);
    }

    let access = issuer.issue(user_id, TokenKind::Access, access_ttl)?;
    let refresh = issuer.issue(user_id, TokenKind::Refresh, refresh_ttl)?;

    let swapped = store
        .swap(
            user_id,
            &hash_token(presented),
            &hash_token(&refresh.token),
            refresh.expires_at,
        )
        .await?;

    if !swapped {
        tracing::warn!(
            user_id,
            "Refresh token does not match stored record, possible reuse"
        );
        return Err(AuthError::TokenInvalid);
    }

    Ok(TokenPair {
        access_token: access.token,
        refresh_token: refresh.token,
        token_type: "Bearer".to_string(),
        expires_in: access_ttl.num_seconds(),
    })
}

// ============================================
// Postgres
// ============================================

pub struct PgRefreshTokenStore {
    db: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn store(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                issued_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn swap(
        &self,
        user_id: i64,
        presented_hash: &str,
        replacement_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens SET
                token_hash = $3,
                expires_at = $4,
                issued_at = NOW()
            WHERE user_id = $1 AND token_hash = $2 AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .bind(presented_hash)
        .bind(replacement_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, user_id: i64, token_hash: &str) -> Result<bool, AuthError> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2")
                .bind(user_id)
                .bind(token_hash)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}

// ============================================
// In-memory
// ============================================

#[derive(Debug, Clone)]
struct StoredToken {
    token_hash: String,
    expires_at: DateTime<Utc>,
}

/// Process-local store, used by tests and local tooling
#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    tokens: Mutex<HashMap<i64, StoredToken>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn store(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.tokens.lock().await.insert(
            user_id,
            StoredToken {
                token_hash: token_hash.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn swap(
        &self,
        user_id: i64,
        presented_hash: &str,
        replacement_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let mut tokens = self.tokens.lock().await;

        match tokens.get_mut(&user_id) {
            Some(stored)
                if stored.token_hash == presented_hash && stored.expires_at > Utc::now() =>
            {
                stored.token_hash = replacement_hash.to_string();
                stored.expires_at = expires_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, user_id: i64, token_hash: &str) -> Result<bool, AuthError> {
        let mut tokens = self.tokens.lock().await;

        match tokens.get(&user_id) {
            Some(stored) if stored.token_hash == token_hash => {
                tokens.remove(&user_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
