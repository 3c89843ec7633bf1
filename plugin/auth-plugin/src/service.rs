//! Authentication Service
//!
//! Orchestrates registration, login and token refresh over the credential
//! store, password hasher, token issuer and refresh token store.

use crate::config::AuthConfig;
use crate::credentials::CredentialStore;
use crate::error::AuthError;
use crate::models::*;
use crate::password::PasswordHasher;
use crate::refresh::{self, hash_token, RefreshTokenStore};
use crate::token::{TokenIssuer, TokenKind};

use std::sync::Arc;
use validator::Validate;

/// Authentication service
pub struct AuthService {
    config: AuthConfig,
    credentials: Arc<dyn CredentialStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    issuer: Arc<TokenIssuer>,
    /// Verified against when the email is unknown, so both login failures cost one hash
    dummy_hash: String,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        config: AuthConfig,
        credentials: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
        )?;
        let issuer = Arc::new(TokenIssuer::new(&config.jwt_secret, &config.jwt_issuer));
        let dummy_hash = hasher.hash("shaheed-unknown-account")?;

        Ok(Self {
            config,
            credentials,
            refresh_tokens,
            hasher,
            issuer,
            dummy_hash,
        })
    }

    /// Get reference to config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Token issuer, shared with request-authorization middleware
    pub fn issuer(&self) -> Arc<TokenIssuer> {
        self.issuer.clone()
    }

    // ============================================
    // User Registration
    // ============================================

    /// Register a new user
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AuthError> {
        // Shape checks come before any store access
        req.validate()?;

        let existing = self
            .credentials
            .find_by_email(&req.email)
            .await
            .map_err(AuthError::into_internal)?;
        if existing.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash_async(&req.password).await?;

        let user = self
            .credentials
            .insert(NewUser {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    // ============================================
    // Login / Logout
    // ============================================

    /// Authenticate by email and password, returning a fresh token pair
    pub async fn login(&self, req: LoginRequest) -> Result<TokenPair, AuthError> {
        let user = self
            .credentials
            .find_by_email(&req.email)
            .await
            .map_err(AuthError::into_internal)?;

        let Some(user) = user else {
            self.hasher
                .verify_async(&req.password, &self.dummy_hash)
                .await
                .map_err(AuthError::into_internal)?;
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self
            .hasher
            .verify_async(&req.password, &user.password_hash)
            .await
            .map_err(AuthError::into_internal)?;

        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self
            .issue_session(user.id)
            .await
            .map_err(AuthError::into_internal)?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    /// Revoke the caller's refresh token; superseded tokens are rejected
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .issuer
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::Unauthorized)?;

        let revoked = self
            .refresh_tokens
            .revoke(claims.sub, &hash_token(refresh_token))
            .await?;

        if !revoked {
            tracing::warn!(user_id = claims.sub, "Logout with a superseded refresh token");
            return Err(AuthError::Unauthorized);
        }

        tracing::info!(user_id = claims.sub, "User logged out");
        Ok(())
    }

    // ============================================
    // Token Refresh
    // ============================================

    /// Exchange a refresh token for a new pair; the presented token stops working
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .issuer
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::Unauthorized)?;

        self.rotate(claims.sub, refresh_token)
            .await
            .map_err(|e| match e {
                AuthError::TokenInvalid | AuthError::TokenExpired => AuthError::Unauthorized,
                other => other,
            })
    }

    /// Rotate `presented` for `user_id` using the configured lifetimes
    pub async fn rotate(&self, user_id: i64, presented: &str) -> Result<TokenPair, AuthError> {
        refresh::rotate(
            self.refresh_tokens.as_ref(),
            &self.issuer,
            user_id,
            presented,
            self.config.refresh_ttl(),
            self.config.access_ttl(),
        )
        .await
    }

    // ============================================
    // User Helpers
    // ============================================

    /// Resolve an authenticated user id to its record
    pub async fn current_user(&self, user_id: i64) -> Result<User, AuthError> {
        self.credentials
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    async fn issue_session(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let access = self
            .issuer
            .issue(user_id, TokenKind::Access, self.config.access_ttl())?;
        let refresh = self
            .issuer
            .issue(user_id, TokenKind::Refresh, self.config.refresh_ttl())?;

        self.refresh_tokens
            .store(user_id, &hash_token(&refresh.token), refresh.expires_at)
            .await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::credentials::MemoryCredentialStore;
    use crate::refresh::MemoryRefreshTokenStore;
    use async_trait::async_trait;

    pub(crate) fn memory_service() -> AuthService {
        AuthService::new(
            test_config(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryRefreshTokenStore::new()),
        )
        .unwrap()
    }

    pub(crate) fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: email.into(),
            password: "password1".into(),
            password_confirm: "password1".into(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Credential store whose lookups always fail
    struct BrokenCredentialStore;

    #[async_trait]
    impl CredentialStore for BrokenCredentialStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, AuthError> {
            Err(AuthError::Persistence("connection refused".into()))
        }

        async fn find_by_id(&self, _id: i64) -> Result<Option<User>, AuthError> {
            Err(AuthError::Persistence("connection refused".into()))
        }

        async fn insert(&self, _user: NewUser) -> Result<User, AuthError> {
            Err(AuthError::Persistence("connection refused".into()))
        }
    }

    fn broken_service() -> AuthService {
        AuthService::new(
            test_config(),
            Arc::new(BrokenCredentialStore),
            Arc::new(MemoryRefreshTokenStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_stores_hashed_password() {
        let auth = memory_service();
        let user = auth.register(register_request("ann@x.com")).await.unwrap();

        assert_eq!(user.email, "ann@x.com");
        assert_ne!(user.password_hash, "password1");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let auth = memory_service();
        let req = RegisterRequest {
            password_confirm: "password2".into(),
            ..register_request("ann@x.com")
        };

        assert!(matches!(
            auth.register(req).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_validates_before_store_access() {
        let auth = broken_service();
        let req = RegisterRequest {
            first_name: "A".into(),
            ..register_request("ann@x.com")
        };

        assert!(matches!(
            auth.register(req).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let auth = memory_service();
        auth.register(register_request("ann@x.com")).await.unwrap();

        let err = auth
            .register(register_request("ann@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::DuplicateEmail);
    }

    #[tokio::test]
    async fn test_register_lookup_failure_is_internal() {
        let err = broken_service()
            .register(register_request("ann@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Internal);
    }

    #[tokio::test]
    async fn test_login_returns_token_pair() {
        let auth = memory_service();
        let user = auth.register(register_request("ann@x.com")).await.unwrap();

        let pair = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
        let claims = auth
            .issuer()
            .verify(&pair.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(claims.sub, user.id);
        assert!(auth
            .issuer()
            .verify(&pair.refresh_token, TokenKind::Refresh)
            .is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = memory_service();
        auth.register(register_request("ann@x.com")).await.unwrap();

        let unknown = auth
            .login(login_request("bob@x.com", "password1"))
            .await
            .unwrap_err();
        let wrong = auth
            .login(login_request("ann@x.com", "password2"))
            .await
            .unwrap_err();

        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(unknown, wrong);
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_login_store_failure_is_internal() {
        let err = broken_service()
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Internal);
    }

    #[tokio::test]
    async fn test_end_to_end_session_flow() {
        let auth = memory_service();

        auth.register(RegisterRequest {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@x.com".into(),
            password: "password1".into(),
            password_confirm: "password1".into(),
        })
        .await
        .unwrap();

        let login = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();

        let refreshed = auth.refresh(&login.refresh_token).await.unwrap();
        assert_ne!(refreshed.refresh_token, login.refresh_token);
        assert_ne!(refreshed.access_token, login.access_token);

        let replay = auth.refresh(&login.refresh_token).await.unwrap_err();
        assert_eq!(replay, AuthError::Unauthorized);

        // The rotated token keeps working
        assert!(auth.refresh(&refreshed.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_login_supersedes_first_refresh_token() {
        let auth = memory_service();
        auth.register(register_request("ann@x.com")).await.unwrap();

        let first = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();
        let second = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();

        assert_eq!(
            auth.refresh(&first.refresh_token).await.unwrap_err(),
            AuthError::Unauthorized
        );
        assert!(auth.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let auth = memory_service();
        auth.register(register_request("ann@x.com")).await.unwrap();
        let pair = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();

        assert_eq!(
            auth.refresh(&pair.access_token).await.unwrap_err(),
            AuthError::Unauthorized
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rotate_single_winner() {
        let auth = Arc::new(memory_service());
        let user_id = auth.register(register_request("ann@x.com")).await.unwrap().id;
        let pair = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();

        let first = {
            let auth = auth.clone();
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { auth.rotate(user_id, &token).await })
        };
        let second = {
            let auth = auth.clone();
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { auth.rotate(user_id, &token).await })
        };

        let (a, b) = (first.await.unwrap(), second.await.unwrap());
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert!(
            matches!(a, Err(AuthError::TokenInvalid)) || matches!(b, Err(AuthError::TokenInvalid))
        );
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let auth = memory_service();
        auth.register(register_request("ann@x.com")).await.unwrap();
        let pair = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();

        auth.logout(&pair.refresh_token).await.unwrap();

        assert_eq!(
            auth.refresh(&pair.refresh_token).await.unwrap_err(),
            AuthError::Unauthorized
        );
        assert_eq!(
            auth.logout("garbage").await.unwrap_err(),
            AuthError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_logout_with_rotated_token_keeps_session() {
        let auth = memory_service();
        auth.register(register_request("ann@x.com")).await.unwrap();
        let old = auth
            .login(login_request("ann@x.com", "password1"))
            .await
            .unwrap();
        let current = auth.refresh(&old.refresh_token).await.unwrap();

        assert_eq!(
            auth.logout(&old.refresh_token).await.unwrap_err(),
            AuthError::Unauthorized
        );

        // The live session is untouched
        let next = auth.refresh(&current.refresh_token).await.unwrap();
        auth.logout(&next.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_email_runs_password_verification() {
        let auth = memory_service();

        // Parsable with the configured cost, so verify does full Argon2 work
        assert!(auth.dummy_hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert!(!auth
            .hasher
            .verify("password1", &auth.dummy_hash)
            .unwrap());

        assert_eq!(
            auth.login(login_request("nobody@x.com", "password1"))
                .await
                .unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_current_user() {
        let auth = memory_service();
        let user = auth.register(register_request("ann@x.com")).await.unwrap();

        assert_eq!(auth.current_user(user.id).await.unwrap().email, "ann@x.com");
        assert_eq!(
            auth.current_user(user.id + 1).await.unwrap_err(),
            AuthError::Unauthorized
        );
    }
}
