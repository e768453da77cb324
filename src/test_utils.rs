pub mod test_helpers {
    use crate::config::AppConfig;
    use crate::models::AttrKind;
    use crate::services::AuthService;
    use crate::AppState;
    use sqlx::{
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
        SqlitePool,
    };
    use std::path::Path;
    use std::str::FromStr;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // A single connection that never expires keeps the in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Application state over `pool`, storing media under `media_root`
    pub fn test_state(pool: &SqlitePool, media_root: &Path) -> AppState {
        AppState::new(pool.clone(), AppConfig::for_media_root(media_root))
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
            })?
            .to_string();

        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Store a token for the user and return its plaintext form
    pub async fn insert_test_token(
        pool: &SqlitePool,
        user_id: i64,
        token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO auth_tokens (user_id, token_hash) VALUES (?, ?)")
            .bind(user_id)
            .bind(AuthService::hash_token(token))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Create a test recipe with sensible defaults
    pub async fn create_test_recipe(
        pool: &SqlitePool,
        user_id: i64,
        title: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, link, description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(22_i64)
        .bind("5.25")
        .bind("http://example.com/recipe.pdf")
        .bind("Sample description")
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Create a tag or ingredient directly
    pub async fn create_test_attr(
        pool: &SqlitePool,
        kind: AttrKind,
        user_id: i64,
        name: &str,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("INSERT INTO {} (user_id, name) VALUES (?, ?)", kind.table());
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(name)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Link a tag or ingredient to a recipe
    pub async fn link_test_attr(
        pool: &SqlitePool,
        kind: AttrKind,
        recipe_id: i64,
        attr_id: i64,
    ) -> Result<(), sqlx::Error> {
        let sql = format!(
            "INSERT INTO {} (recipe_id, {}) VALUES (?, ?)",
            kind.join_table(),
            kind.join_column()
        );
        sqlx::query(&sql)
            .bind(recipe_id)
            .bind(attr_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Count rows in a table owned by the user
    pub async fn count_for_user(
        pool: &SqlitePool,
        table: &str,
        user_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?", table);
        sqlx::query_scalar(&sql).bind(user_id).fetch_one(pool).await
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}

#[cfg(test)]
pub async fn create_test_user(
    pool: &sqlx::SqlitePool,
    email: &str,
    password: &str,
) -> Result<i64, sqlx::Error> {
    test_helpers::insert_test_user(pool, email, password).await
}
