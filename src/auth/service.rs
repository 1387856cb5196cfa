//! Authentication service
//!
//! bcrypt password hashing and random session tokens stored token -> user id
//! in the repository.

use crate::db::Repository;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::User;
use crate::util::{new_id, now_millis};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Serialize;
use std::sync::Arc;

/// Successful authentication payload
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub user_id: String,
    pub email: String,
    pub token: String,
}

/// Registration, login, and session management
pub struct AuthService {
    repo: Arc<dyn Repository>,
}

impl AuthService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Hash a plain-text password with bcrypt
    pub fn hash_password(password: &str) -> AppResult<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a password against a stored hash
    pub fn verify_password(password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Generate an opaque session token (32 random bytes, URL-safe base64)
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Create a user and open a session for it
    pub async fn register(&self, email: &str, password: &str) -> AppResult<AuthPayload> {
        let now = now_millis();
        let user = User {
            id: new_id(),
            email: email.to_string(),
            password_hash: Self::hash_password(password)?,
            created_at: now,
            updated_at: now,
        };

        self.repo.create_user(user.clone()).await.map_err(|e| {
            if matches!(e, crate::db::RepoError::Duplicate(_)) {
                AppError::new(ErrorCode::EmailAlreadyRegistered)
            } else {
                e.into()
            }
        })?;

        let token = Self::generate_token();
        self.repo.create_session(&user.id, &token).await?;

        tracing::info!(email = %user.email, "User registered");
        Ok(AuthPayload {
            user_id: user.id,
            email: user.email,
            token,
        })
    }

    /// Authenticate by email and password, opening a new session
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthPayload> {
        let user = self
            .repo
            .get_user_by_email(email)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        if !Self::verify_password(password, &user.password_hash) {
            return Err(AppError::invalid_credentials());
        }

        let token = Self::generate_token();
        self.repo.create_session(&user.id, &token).await?;

        tracing::info!(email = %user.email, "User logged in");
        Ok(AuthPayload {
            user_id: user.id,
            email: user.email,
            token,
        })
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.repo.delete_session(token).await?;
        tracing::info!("User logged out");
        Ok(())
    }

    /// Resolve a session token to a user id
    pub async fn resolve_token(&self, token: &str) -> AppResult<Option<String>> {
        Ok(self.repo.resolve_session(token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryRepository::new()))
    }

    #[test]
    fn test_password_round_trip() {
        let hash = AuthService::hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(AuthService::verify_password("secret123", &hash));
        assert!(!AuthService::verify_password("wrong", &hash));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(AuthService::generate_token(), AuthService::generate_token());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let registered = auth.register("a@example.com", "secret123").await.unwrap();
        assert_eq!(registered.email, "a@example.com");

        let resolved = auth.resolve_token(&registered.token).await.unwrap();
        assert_eq!(resolved.as_deref(), Some(registered.user_id.as_str()));

        let logged_in = auth.login("a@example.com", "secret123").await.unwrap();
        assert_eq!(logged_in.user_id, registered.user_id);
        assert_ne!(logged_in.token, registered.token);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let auth = service();
        auth.register("a@example.com", "secret123").await.unwrap();

        let err = auth.register("a@example.com", "other").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let auth = service();
        auth.register("a@example.com", "secret123").await.unwrap();

        let err = auth.login("a@example.com", "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let auth = service();
        let payload = auth.register("a@example.com", "secret123").await.unwrap();

        auth.logout(&payload.token).await.unwrap();
        assert!(auth.resolve_token(&payload.token).await.unwrap().is_none());
    }
}
