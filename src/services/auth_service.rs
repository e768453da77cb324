use crate::error::AppError;
use crate::models::user::User;
use crate::repositories::token_repository::TokenRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::{normalize_email, verify_password};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Raw token length in bytes; rendered as 40 hex characters.
const TOKEN_BYTES: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Unable to authenticate with provided credentials.")]
    InvalidCredentials,
    #[error("Invalid token.")]
    InvalidToken,
    #[error("User inactive or deleted.")]
    InactiveUser,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] crate::repositories::user_repository::RepositoryError),
    #[error(transparent)]
    App(#[from] AppError),
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials => AppError::InvalidCredentials,
            AuthServiceError::InvalidToken => AppError::InvalidToken,
            AuthServiceError::InactiveUser => AppError::InactiveUser,
            AuthServiceError::RepositoryError(e) => {
                tracing::error!("User repository failure during authentication: {}", e);
                AppError::InternalError
            }
            AuthServiceError::App(e) => e,
        }
    }
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    token_repository: Arc<dyn TokenRepository>,
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_repository: Arc<dyn TokenRepository>,
    ) -> Self {
        Self {
            user_repository,
            token_repository,
        }
    }

    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AuthServiceError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthServiceError::InvalidCredentials);
        }

        // Find user by email
        let user = self
            .user_repository
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        // Verify password
        if !verify_password(&request.password, &user.password_hash) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Issues a fresh token for the user, invalidating the previous one.
    /// The plaintext token is returned once and never stored.
    pub async fn issue_token(&self, user: &User) -> Result<String, AuthServiceError> {
        let token = Self::generate_token();
        self.token_repository
            .replace_token(user.id, &Self::hash_token(&token))
            .await?;

        tracing::info!("Issued API token for user {}", user.id);
        Ok(token)
    }

    /// Resolves a presented token to its active user.
    pub async fn authenticate_token(&self, token: &str) -> Result<User, AuthServiceError> {
        let user = self
            .token_repository
            .find_user_by_token_hash(&Self::hash_token(token))
            .await?
            .ok_or(AuthServiceError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthServiceError::InactiveUser);
        }

        Ok(user)
    }

    pub async fn revoke_token(&self, user_id: i64) -> Result<bool, AuthServiceError> {
        Ok(self.token_repository.delete_token(user_id).await?)
    }

    /// Marks the user inactive and drops their token so they can neither log
    /// in nor keep using an issued token.
    pub async fn deactivate(&self, user_id: i64) -> Result<(), AuthServiceError> {
        self.user_repository.set_active(user_id, false).await?;
        if self.revoke_token(user_id).await? {
            tracing::info!("Revoked API token of deactivated user {}", user_id);
        }
        Ok(())
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Hash a token using SHA-256
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
