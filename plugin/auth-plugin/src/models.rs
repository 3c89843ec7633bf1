//! Authentication Models
//!
//! Data structures for authentication requests, responses, and database entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// ============================================
// Database Entities
// ============================================

/// User entity from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

// ============================================
// Request DTOs
// ============================================

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,

    #[validate(
        length(min = 5, message = "Email must be at least 5 characters"),
        email(message = "Invalid email format")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

// ============================================
// Response DTOs
// ============================================

/// User response (public user data without sensitive fields)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Access and refresh token pair returned by login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Simple message response
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@x.com".into(),
            password: "password1".into(),
            password_confirm: "password1".into(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_registration_field_lengths() {
        let short_name = RegisterRequest {
            first_name: "A".into(),
            ..request()
        };
        assert!(short_name.validate().is_err());

        let short_password = RegisterRequest {
            password: "short".into(),
            password_confirm: "short".into(),
            ..request()
        };
        assert!(short_password.validate().is_err());

        let short_email = RegisterRequest {
            email: "a@b".into(),
            ..request()
        };
        assert!(short_email.validate().is_err());
    }

    #[test]
    fn test_registration_password_confirmation() {
        let mismatch = RegisterRequest {
            password_confirm: "password2".into(),
            ..request()
        };
        let errors = mismatch.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password_confirm"));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }
}
