//! Authentication Configuration
//!
//! All configuration values are loaded from environment variables and handed
//! to `AuthService::new` explicitly. No hardcoded secrets.

use crate::error::AuthError;
use chrono::Duration;
use std::env;

/// Authentication configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for signing tokens (from AUTH_SECRET env var)
    pub jwt_secret: String,

    /// Access token lifetime in seconds (from AUTH_EXP env var)
    pub access_token_expiration: i64,

    /// Refresh token lifetime in seconds (from AUTH_REFRESH_EXP env var)
    pub refresh_token_expiration: i64,

    /// JWT issuer (from AUTH_ISSUER env var)
    pub jwt_issuer: String,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = env::var("AUTH_SECRET")
            .map_err(|_| AuthError::Config("AUTH_SECRET must be set".to_string()))?;

        Ok(Self {
            jwt_secret,
            access_token_expiration: parse_or("AUTH_EXP", 900)?, // 15 minutes
            refresh_token_expiration: parse_or("AUTH_REFRESH_EXP", 604800)?, // 7 days
            jwt_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "shaheed".to_string()),
            argon2_memory_cost: parse_or("ARGON2_MEMORY_COST", 65536)?, // 64 MiB
            argon2_time_cost: parse_or("ARGON2_TIME_COST", 3)?,
            argon2_parallelism: parse_or("ARGON2_PARALLELISM", 4)?,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.len() < 32 {
            return Err(AuthError::Config(
                "AUTH_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.access_token_expiration <= 0 {
            return Err(AuthError::Config("AUTH_EXP must be positive".to_string()));
        }

        if self.refresh_token_expiration <= self.access_token_expiration {
            return Err(AuthError::Config(
                "AUTH_REFRESH_EXP must be greater than AUTH_EXP".to_string(),
            ));
        }

        Ok(())
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_expiration)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_expiration)
    }
}

/// Unset falls back to `default`; a set but unparsable value is an error
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AuthError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| {
            AuthError::Config(format!("{key} must be a whole number, got {value:?}"))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "a".repeat(32),
        access_token_expiration: 900,
        refresh_token_expiration: 604800,
        jwt_issuer: "test".to_string(),
        // Cheap parameters keep the test suite fast
        argon2_memory_cost: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_secret() {
        let config = AuthConfig {
            jwt_secret: "VERYSECRET".to_string(),
            ..test_config()
        };

        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_config_validation_refresh_not_longer_than_access() {
        let config = AuthConfig {
            access_token_expiration: 3600,
            refresh_token_expiration: 3600,
            ..test_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_or_rejects_malformed_value() {
        env::set_var("SHAHEED_TEST_PARSE_OR_MALFORMED", "15m");
        let result = parse_or::<i64>("SHAHEED_TEST_PARSE_OR_MALFORMED", 900);
        assert!(matches!(result, Err(AuthError::Config(msg)) if msg.contains("15m")));

        env::set_var("SHAHEED_TEST_PARSE_OR_VALID", "1800");
        assert_eq!(parse_or::<i64>("SHAHEED_TEST_PARSE_OR_VALID", 900).unwrap(), 1800);

        assert_eq!(parse_or::<i64>("SHAHEED_TEST_PARSE_OR_UNSET", 900).unwrap(), 900);
    }

    #[test]
    fn test_ttl_helpers() {
        let config = test_config();
        assert_eq!(config.access_ttl(), Duration::minutes(15));
        assert_eq!(config.refresh_ttl(), Duration::days(7));
    }
}
