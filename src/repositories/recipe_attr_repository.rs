use super::is_unique_violation;
use crate::error::{AppError, Result};
use crate::models::{AttrKind, RecipeAttr};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

/// Queries shared by tags and ingredients. `AttrKind` selects the tables.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RecipeAttrRepository: Send + Sync {
    /// Lists the user's records ordered by name, descending. With
    /// `assigned_only`, keeps only records linked to at least one recipe.
    async fn list_by_user(
        &self,
        kind: AttrKind,
        user_id: i64,
        assigned_only: bool,
    ) -> Result<Vec<RecipeAttr>>;
    async fn get_by_id(&self, kind: AttrKind, id: i64, user_id: i64)
        -> Result<Option<RecipeAttr>>;
    /// Returns `Ok(false)` when no record matched `(id, user_id)`.
    async fn rename(&self, kind: AttrKind, id: i64, user_id: i64, name: String) -> Result<bool>;
    async fn delete(&self, kind: AttrKind, id: i64, user_id: i64) -> Result<bool>;
}

pub struct SqliteRecipeAttrRepository {
    pool: SqlitePool,
}

impl SqliteRecipeAttrRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeAttrRepository for SqliteRecipeAttrRepository {
    async fn list_by_user(
        &self,
        kind: AttrKind,
        user_id: i64,
        assigned_only: bool,
    ) -> Result<Vec<RecipeAttr>> {
        let sql = if assigned_only {
            format!(
                r#"
                SELECT a.id, a.user_id, a.name
                FROM {table} a
                WHERE a.user_id = ?
                  AND EXISTS (SELECT 1 FROM {join} j WHERE j.{column} = a.id)
                ORDER BY a.name DESC
                "#,
                table = kind.table(),
                join = kind.join_table(),
                column = kind.join_column(),
            )
        } else {
            format!(
                "SELECT id, user_id, name FROM {} WHERE user_id = ? ORDER BY name DESC",
                kind.table()
            )
        };

        let attrs = sqlx::query_as::<_, RecipeAttr>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(attrs)
    }

    async fn get_by_id(
        &self,
        kind: AttrKind,
        id: i64,
        user_id: i64,
    ) -> Result<Option<RecipeAttr>> {
        let sql = format!(
            "SELECT id, user_id, name FROM {} WHERE id = ? AND user_id = ?",
            kind.table()
        );
        let attr = sqlx::query_as::<_, RecipeAttr>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attr)
    }

    async fn rename(&self, kind: AttrKind, id: i64, user_id: i64, name: String) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET name = ? WHERE id = ? AND user_id = ?",
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(&name)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(format!(
                "name: {} with this name already exists.",
                kind.label()
            ))),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn delete(&self, kind: AttrKind, id: i64, user_id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ? AND user_id = ?", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Fetches the `(user_id, name)` record, creating it if absent.
///
/// A single upsert against the `UNIQUE(user_id, name)` constraint, so two
/// concurrent writers always end up sharing one row.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    kind: AttrKind,
    user_id: i64,
    name: &str,
) -> Result<RecipeAttr> {
    let sql = format!(
        r#"
        INSERT INTO {} (user_id, name) VALUES (?, ?)
        ON CONFLICT(user_id, name) DO UPDATE SET name = excluded.name
        RETURNING id, user_id, name
        "#,
        kind.table()
    );

    let attr = sqlx::query_as::<_, RecipeAttr>(&sql)
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(attr)
}

/// Links a record to a recipe. Linking twice is a no-op.
pub async fn attach(
    conn: &mut SqliteConnection,
    kind: AttrKind,
    recipe_id: i64,
    attr_id: i64,
) -> Result<()> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?, ?)",
        kind.join_table(),
        kind.join_column()
    );
    sqlx::query(&sql)
        .bind(recipe_id)
        .bind(attr_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Removes every link of this kind from the recipe. The records themselves stay.
pub async fn clear(conn: &mut SqliteConnection, kind: AttrKind, recipe_id: i64) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE recipe_id = ?", kind.join_table());
    sqlx::query(&sql)
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Get-or-create every name and link it to the recipe.
pub async fn assign_all(
    conn: &mut SqliteConnection,
    kind: AttrKind,
    user_id: i64,
    recipe_id: i64,
    names: &[String],
) -> Result<()> {
    for name in names {
        let attr = get_or_create(&mut *conn, kind, user_id, name).await?;
        attach(&mut *conn, kind, recipe_id, attr.id).await?;
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct LinkedAttr {
    recipe_id: i64,
    id: i64,
    user_id: i64,
    name: String,
}

/// Loads the linked records for each recipe, keyed by recipe id, ordered by record id.
pub async fn load_for_recipes(
    conn: &mut SqliteConnection,
    kind: AttrKind,
    recipe_ids: &[i64],
) -> Result<HashMap<i64, Vec<RecipeAttr>>> {
    let mut by_recipe: HashMap<i64, Vec<RecipeAttr>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(by_recipe);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT j.recipe_id, a.id, a.user_id, a.name FROM {join} j \
         INNER JOIN {table} a ON a.id = j.{column} WHERE j.recipe_id IN (",
        join = kind.join_table(),
        table = kind.table(),
        column = kind.join_column(),
    ));
    let mut separated = builder.separated(", ");
    for id in recipe_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY a.id ASC");

    let rows = builder
        .build_query_as::<LinkedAttr>()
        .fetch_all(&mut *conn)
        .await?;

    for row in rows {
        by_recipe.entry(row.recipe_id).or_default().push(RecipeAttr {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
        });
    }

    Ok(by_recipe)
}
