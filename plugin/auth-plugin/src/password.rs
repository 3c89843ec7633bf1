//! Password Hashing
//!
//! Argon2id hashing. The PHC string output carries algorithm, version, cost
//! and salt, so verification reads everything it needs from the stored hash.

use crate::error::AuthError;

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Salted, memory-hard password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with the given Argon2id cost parameters
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_cost, time_cost, parallelism, None)
            .map_err(|e| AuthError::Config(format!("invalid argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();

        Ok(hash)
    }

    /// Verify a password against a stored hash
    ///
    /// A mismatch is `Ok(false)`; only a malformed hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }

    /// Hash on the blocking pool so request workers are not stalled
    pub async fn hash_async(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("hashing task failed: {e}")))?
    }

    /// Verify on the blocking pool
    pub async fn verify_async(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = self.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(format!("verification task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("password1").unwrap();

        assert!(hasher.verify("password1", &hash).unwrap());
        assert!(!hasher.verify("password2", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let first = hasher.hash("password1").unwrap();
        let second = hasher.hash("password1").unwrap();

        assert_ne!(first, "password1");
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
    }

    #[test]
    fn test_verify_reads_cost_from_hash() {
        let hash = hasher().hash("password1").unwrap();
        let other = PasswordHasher::new(2048, 2, 1).unwrap();

        assert!(other.verify("password1", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let result = hasher().verify("password1", "not-a-hash");
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(matches!(
            PasswordHasher::new(0, 0, 0),
            Err(AuthError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let hasher = hasher();
        let hash = hasher.hash_async("correct horse").await.unwrap();

        assert!(hasher.verify_async("correct horse", &hash).await.unwrap());
        assert!(!hasher.verify_async("battery staple", &hash).await.unwrap());
    }
}
