use super::is_unique_violation;
use crate::models::user::User;
use async_trait::async_trait;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("User not found")]
    NotFound,
    #[error("User already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()>;
    async fn update_email(&self, id: i64, email: &str) -> RepositoryResult<()>;
    async fn update_name(&self, id: i64, name: &str) -> RepositoryResult<()>;
    async fn set_active(&self, id: i64, is_active: bool) -> RepositoryResult<()>;
    async fn delete_user(&self, id: i64) -> RepositoryResult<()>;
    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn ensure_affected(rows_affected: u64) -> RepositoryResult<()> {
    if rows_affected == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> RepositoryResult<User> {
        let result = sqlx::query!(
            r#"
            INSERT INTO users (email, password_hash, name, is_staff, is_superuser)
            VALUES (?, ?, ?, ?, ?)
            "#,
            email,
            password_hash,
            name,
            is_staff,
            is_superuser
        )
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => {
                let id = res.last_insert_rowid();
                self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
            }
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::AlreadyExists),
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                id as "id!",
                email as "email!",
                password_hash as "password_hash!",
                name as "name!",
                is_active as "is_active!: bool",
                is_staff as "is_staff!: bool",
                is_superuser as "is_superuser!: bool",
                created_at as "created_at?"
            FROM users
            WHERE email = ?
            "#,
            email
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                id as "id!",
                email as "email!",
                password_hash as "password_hash!",
                name as "name!",
                is_active as "is_active!: bool",
                is_staff as "is_staff!: bool",
                is_superuser as "is_superuser!: bool",
                created_at as "created_at?"
            FROM users
            WHERE id = ?
            "#,
            id
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query!(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            password_hash,
            id
        )
        .execute(&self.pool)
        .await?;

        ensure_affected(result.rows_affected())
    }

    async fn update_email(&self, id: i64, email: &str) -> RepositoryResult<()> {
        let result = sqlx::query!("UPDATE users SET email = ? WHERE id = ?", email, id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(res) => ensure_affected(res.rows_affected()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::AlreadyExists),
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    async fn update_name(&self, id: i64, name: &str) -> RepositoryResult<()> {
        let result = sqlx::query!("UPDATE users SET name = ? WHERE id = ?", name, id)
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected())
    }

    async fn set_active(&self, id: i64, is_active: bool) -> RepositoryResult<()> {
        let result = sqlx::query!(
            "UPDATE users SET is_active = ? WHERE id = ?",
            is_active,
            id
        )
        .execute(&self.pool)
        .await?;

        ensure_affected(result.rows_affected())
    }

    async fn delete_user(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query!("DELETE FROM users WHERE id = ?", id)
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected())
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        let limit = limit.unwrap_or(100);
        let offset = offset.unwrap_or(0);

        let users = sqlx::query_as!(
            User,
            r#"
            SELECT
                id as "id!",
                email as "email!",
                password_hash as "password_hash!",
                name as "name!",
                is_active as "is_active!: bool",
                is_staff as "is_staff!: bool",
                is_superuser as "is_superuser!: bool",
                created_at as "created_at?"
            FROM users
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
            limit,
            offset
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
