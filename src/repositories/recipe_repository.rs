use super::recipe_attr_repository::{assign_all, clear, load_for_recipes};
use crate::error::{AppError, Result};
use crate::models::recipe::normalize_price;
use crate::models::{AttrKind, NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeRow};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RecipeRepository: Send + Sync {
    async fn create(&self, user_id: i64, recipe: NewRecipe) -> Result<Recipe>;
    async fn get_by_id(&self, id: i64, user_id: i64) -> Result<Option<Recipe>>;
    async fn list_by_user(&self, user_id: i64, filter: RecipeFilter) -> Result<Vec<Recipe>>;
    /// Applies the changes and returns the updated recipe, or `None` if the
    /// recipe does not belong to the user.
    async fn update(
        &self,
        id: i64,
        user_id: i64,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>>;
    async fn set_image(&self, id: i64, user_id: i64, image: Option<String>) -> Result<bool>;
    async fn delete(&self, id: i64, user_id: i64) -> Result<bool>;
    /// Stored image paths of every recipe the user owns.
    async fn list_images_by_user(&self, user_id: i64) -> Result<Vec<String>>;
}

pub struct SqliteRecipeRepository {
    pool: SqlitePool,
}

impl SqliteRecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const RECIPE_COLUMNS: &str =
    "r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.description, r.image";

/// Attaches tags and ingredients to the rows, preserving row order.
async fn hydrate(conn: &mut SqliteConnection, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut tags = load_for_recipes(&mut *conn, AttrKind::Tag, &ids).await?;
    let mut ingredients = load_for_recipes(&mut *conn, AttrKind::Ingredient, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            Recipe::from_row(
                row,
                tags.remove(&id).unwrap_or_default(),
                ingredients.remove(&id).unwrap_or_default(),
            )
            .map_err(|e| {
                tracing::error!("Recipe {} has an unreadable price: {}", id, e);
                AppError::InternalError
            })
        })
        .collect()
}

async fn fetch_one(conn: &mut SqliteConnection, id: i64, user_id: i64) -> Result<Option<Recipe>> {
    let row = sqlx::query_as!(
        RecipeRow,
        r#"
        SELECT
            r.id as "id!",
            r.user_id as "user_id!",
            r.title as "title!",
            r.time_minutes as "time_minutes!",
            r.price as "price!",
            r.link as "link!",
            r.description as "description!",
            r.image as "image?"
        FROM recipes r
        WHERE r.id = ? AND r.user_id = ?
        "#,
        id,
        user_id
    )
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

fn push_id_filter(
    builder: &mut QueryBuilder<'_, Sqlite>,
    kind: AttrKind,
    ids: &[i64],
) {
    if ids.is_empty() {
        return;
    }
    builder.push(format!(
        " AND r.id IN (SELECT recipe_id FROM {} WHERE {} IN (",
        kind.join_table(),
        kind.join_column()
    ));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated("))");
}

#[async_trait]
impl RecipeRepository for SqliteRecipeRepository {
    async fn create(&self, user_id: i64, recipe: NewRecipe) -> Result<Recipe> {
        // The recipe row and its links commit together
        let mut tx = self.pool.begin().await?;

        let price = normalize_price(recipe.price).to_string();
        let recipe_id = sqlx::query!(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, link, description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            user_id,
            recipe.title,
            recipe.time_minutes,
            price,
            recipe.link,
            recipe.description
        )
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        assign_all(&mut tx, AttrKind::Tag, user_id, recipe_id, &recipe.tags).await?;
        assign_all(
            &mut tx,
            AttrKind::Ingredient,
            user_id,
            recipe_id,
            &recipe.ingredients,
        )
        .await?;

        let created = fetch_one(&mut tx, recipe_id, user_id)
            .await?
            .ok_or(AppError::InternalError)?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_by_id(&self, id: i64, user_id: i64) -> Result<Option<Recipe>> {
        let mut conn = self.pool.acquire().await?;
        fetch_one(&mut conn, id, user_id).await
    }

    async fn list_by_user(&self, user_id: i64, filter: RecipeFilter) -> Result<Vec<Recipe>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM recipes r WHERE r.user_id = ",
            RECIPE_COLUMNS
        ));
        builder.push_bind(user_id);
        push_id_filter(&mut builder, AttrKind::Tag, &filter.tag_ids);
        push_id_filter(&mut builder, AttrKind::Ingredient, &filter.ingredient_ids);
        builder.push(" ORDER BY r.id DESC");

        let mut conn = self.pool.acquire().await?;
        let rows = builder
            .build_query_as::<RecipeRow>()
            .fetch_all(&mut *conn)
            .await?;

        hydrate(&mut conn, rows).await
    }

    async fn update(
        &self,
        id: i64,
        user_id: i64,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;

        let title = changes.title.as_deref();
        let price = changes.price.map(|p| normalize_price(p).to_string());
        let link = changes.link.as_deref();
        let description = changes.description.as_deref();

        // NULL binds keep the current column value
        let result = sqlx::query!(
            r#"
            UPDATE recipes SET
                title = COALESCE(?, title),
                time_minutes = COALESCE(?, time_minutes),
                price = COALESCE(?, price),
                link = COALESCE(?, link),
                description = COALESCE(?, description)
            WHERE id = ? AND user_id = ?
            "#,
            title,
            changes.time_minutes,
            price,
            link,
            description,
            id,
            user_id
        )
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(tags) = &changes.tags {
            clear(&mut tx, AttrKind::Tag, id).await?;
            assign_all(&mut tx, AttrKind::Tag, user_id, id, tags).await?;
        }

        if let Some(ingredients) = &changes.ingredients {
            clear(&mut tx, AttrKind::Ingredient, id).await?;
            assign_all(&mut tx, AttrKind::Ingredient, user_id, id, ingredients).await?;
        }

        let updated = fetch_one(&mut tx, id, user_id).await?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn set_image(&self, id: i64, user_id: i64, image: Option<String>) -> Result<bool> {
        let result = sqlx::query!(
            "UPDATE recipes SET image = ? WHERE id = ? AND user_id = ?",
            image,
            id,
            user_id
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query!(
            "DELETE FROM recipes WHERE id = ? AND user_id = ?",
            id,
            user_id
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_images_by_user(&self, user_id: i64) -> Result<Vec<String>> {
        let images = sqlx::query_scalar!(
            r#"
            SELECT image as "image!"
            FROM recipes
            WHERE user_id = ? AND image IS NOT NULL
            ORDER BY id
            "#,
            user_id
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }
}
