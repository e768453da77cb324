use crate::error::AppError;
use crate::models::user::User;
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use std::sync::Arc;

/// Minimum password length accepted from API clients.
pub const MIN_PASSWORD_LENGTH: usize = 5;
const MAX_EMAIL_LENGTH: usize = 255;
const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Users must have an email address")]
    EmptyEmail,
    #[error("Enter a valid email address.")]
    InvalidEmail,
    #[error("Ensure this field has at least 5 characters.")]
    WeakPassword,
    #[error("Ensure this field has no more than 255 characters.")]
    NameTooLong,
    #[error("User not found")]
    UserNotFound,
    #[error("user with this email already exists.")]
    EmailTaken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::EmptyEmail | UserServiceError::InvalidEmail => {
                AppError::Validation(format!("email: {}", err))
            }
            UserServiceError::EmailTaken => AppError::Validation(format!("email: {}", err)),
            UserServiceError::WeakPassword => AppError::Validation(format!("password: {}", err)),
            UserServiceError::NameTooLong => AppError::Validation(format!("name: {}", err)),
            UserServiceError::UserNotFound => AppError::NotFound("User"),
            UserServiceError::HashingError(_) | UserServiceError::RepositoryError(_) => {
                tracing::error!("User service failure: {}", err);
                AppError::InternalError
            }
        }
    }
}

pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Default)]
pub struct UpdateProfileRequest {
    pub user_id: i64,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Lower-cases the domain part of an email; the local part is kept as typed.
pub fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.trim().to_string(),
    }
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Creates a regular user. Only an empty email is rejected here; API
    /// input goes through [`UserService::register`] for full validation.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        self.insert_user(request, false).await
    }

    /// Creates a user with staff and superuser flags forced on.
    pub async fn create_superuser(
        &self,
        request: CreateUserRequest,
    ) -> Result<User, UserServiceError> {
        self.insert_user(request, true).await
    }

    /// Validates API input, then creates a regular user.
    pub async fn register(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        self.validate_email(&request.email)?;
        self.validate_password(&request.password)?;
        self.validate_name(&request.name)?;
        self.create_user(request).await
    }

    async fn insert_user(
        &self,
        request: CreateUserRequest,
        superuser: bool,
    ) -> Result<User, UserServiceError> {
        if request.email.trim().is_empty() {
            return Err(UserServiceError::EmptyEmail);
        }

        let email = normalize_email(&request.email);
        let password_hash = self.hash_password(&request.password)?;

        match self
            .repository
            .create_user(&email, &password_hash, &request.name, superuser, superuser)
            .await
        {
            Ok(user) => {
                tracing::info!("Created user {} (superuser: {})", user.id, superuser);
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(&normalize_email(email)).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), UserServiceError> {
        match self.repository.delete_user(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<(), UserServiceError> {
        match self.repository.set_active(id, is_active).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Sets a password without the API length rule, as an administrator would.
    pub async fn set_password(&self, id: i64, password: &str) -> Result<(), UserServiceError> {
        let password_hash = self.hash_password(password)?;
        match self.repository.update_password(id, &password_hash).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Applies the supplied fields and returns the refreshed user.
    pub async fn update_profile(
        &self,
        request: UpdateProfileRequest,
    ) -> Result<User, UserServiceError> {
        if let Some(ref email) = request.email {
            self.validate_email(email)?;
        }
        if let Some(ref password) = request.password {
            self.validate_password(password)?;
        }
        if let Some(ref name) = request.name {
            self.validate_name(name)?;
        }

        if let Some(email) = request.email {
            let email = normalize_email(&email);
            // Check if email is already taken by another user
            if let Some(existing_user) = self.repository.find_by_email(&email).await? {
                if existing_user.id != request.user_id {
                    return Err(UserServiceError::EmailTaken);
                }
            }
            match self.repository.update_email(request.user_id, &email).await {
                Ok(()) => {}
                Err(RepositoryError::AlreadyExists) => return Err(UserServiceError::EmailTaken),
                Err(RepositoryError::NotFound) => return Err(UserServiceError::UserNotFound),
                Err(e) => return Err(UserServiceError::RepositoryError(e)),
            }
        }

        if let Some(name) = request.name {
            self.repository.update_name(request.user_id, &name).await?;
        }

        if let Some(password) = request.password {
            self.set_password(request.user_id, &password).await?;
        }

        self.repository
            .find_by_id(request.user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    fn validate_email(&self, email: &str) -> Result<(), UserServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(UserServiceError::EmptyEmail);
        }
        match email.rsplit_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && email.len() <= MAX_EMAIL_LENGTH =>
            {
                Ok(())
            }
            _ => Err(UserServiceError::InvalidEmail),
        }
    }

    fn validate_password(&self, password: &str) -> Result<(), UserServiceError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(UserServiceError::WeakPassword);
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<(), UserServiceError> {
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(UserServiceError::NameTooLong);
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, UserServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserServiceError::HashingError(e.to_string()))
    }

    pub fn check_password(&self, user: &User, password: &str) -> bool {
        verify_password(password, &user.password_hash)
    }
}

/// Checks `password` against a stored argon2 hash. An unparsable hash never matches.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}
