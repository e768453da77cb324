use crate::error::Result;
use crate::models::user::User;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Storage for API tokens. Only the SHA-256 hash of a token is persisted.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TokenRepository: Send + Sync {
    /// Stores `token_hash` as the user's only token, replacing any previous one.
    async fn replace_token(&self, user_id: i64, token_hash: &str) -> Result<()>;
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>>;
    async fn delete_token(&self, user_id: i64) -> Result<bool>;
}

pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn replace_token(&self, user_id: i64, token_hash: &str) -> Result<()> {
        sqlx::query!(
            r#"
            INSERT INTO auth_tokens (user_id, token_hash)
            VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                token_hash = excluded.token_hash,
                created_at = CURRENT_TIMESTAMP
            "#,
            user_id,
            token_hash
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                u.id as "id!",
                u.email as "email!",
                u.password_hash as "password_hash!",
                u.name as "name!",
                u.is_active as "is_active!: bool",
                u.is_staff as "is_staff!: bool",
                u.is_superuser as "is_superuser!: bool",
                u.created_at as "created_at?"
            FROM auth_tokens t
            INNER JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = ?
            "#,
            token_hash
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_token(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query!("DELETE FROM auth_tokens WHERE user_id = ?", user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
