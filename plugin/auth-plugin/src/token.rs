//! Token Issuer
//!
//! HS256 JWTs for access and refresh tokens. Both kinds share the signing key,
//! so every token carries a `kind` claim and verification pins the kind it
//! expects.

use crate::error::AuthError;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which purpose a token was minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Token purpose
    pub kind: TokenKind,
    /// JWT ID, keeps tokens minted in the same second distinct
    pub jti: Uuid,
}

/// A freshly signed token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens with a shared secret
pub struct TokenIssuer {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a token of `kind` for `user_id`, valid for `ttl`
    pub fn issue(
        &self,
        user_id: i64,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = TokenClaims {
            sub: user_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            kind,
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, expiry and kind, returning the claims
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation.set_issuer(&[&self.issuer]);

        let token_data =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!("JWT validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid,
                }
            })?;

        if token_data.claims.kind != kind {
            tracing::debug!(
                expected = ?kind,
                actual = ?token_data.claims.kind,
                "Token kind mismatch"
            );
            return Err(AuthError::TokenInvalid);
        }

        Ok(token_data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::Unauthorized)?;

    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(AuthError::Unauthorized),
    }
}
