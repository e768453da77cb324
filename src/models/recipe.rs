use super::recipe_attr::{AttrPayload, Ingredient, Tag};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Scale used for every price that leaves or enters the database.
pub const PRICE_SCALE: u32 = 2;
/// Digits allowed left of the decimal point (max_digits 5, scale 2).
pub const PRICE_INTEGER_DIGITS: u32 = 3;

#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: String,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    pub fn from_row(
        row: RecipeRow,
        tags: Vec<Tag>,
        ingredients: Vec<Ingredient>,
    ) -> Result<Self, rust_decimal::Error> {
        Ok(Recipe {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            time_minutes: row.time_minutes,
            price: Decimal::from_str(&row.price)?,
            link: row.link,
            description: row.description,
            image: row.image,
            tags,
            ingredients,
        })
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Renders a price with exactly two decimal places, e.g. `5.5` -> `5.50`.
pub fn normalize_price(price: Decimal) -> Decimal {
    let mut price = price.round_dp(PRICE_SCALE);
    price.rescale(PRICE_SCALE);
    price
}

/// Shape used by the recipe list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Tag>,
    #[serde(rename = "ingredient", alias = "ingredients")]
    pub ingredients: Vec<Ingredient>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        RecipeSummary {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: normalize_price(recipe.price),
            link: recipe.link,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }
    }
}

/// Shape used by single-recipe endpoints: the summary plus description and image URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
    pub image: Option<String>,
}

impl RecipeDetail {
    pub fn from_recipe(recipe: Recipe, media_url: &str) -> Self {
        let description = recipe.description.clone();
        let image = recipe.image.as_deref().map(|path| media_path(media_url, path));
        RecipeDetail {
            summary: recipe.into(),
            description,
            image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeImage {
    pub id: i64,
    pub image: Option<String>,
}

impl RecipeImage {
    pub fn from_recipe(recipe: &Recipe, media_url: &str) -> Self {
        RecipeImage {
            id: recipe.id,
            image: recipe
                .image
                .as_deref()
                .map(|path| media_path(media_url, path)),
        }
    }
}

fn media_path(media_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        media_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Incoming recipe body for create, full update and partial update.
///
/// Every field is optional at the parsing stage; which ones are required
/// depends on the operation and is checked by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<AttrPayload>>,
    #[serde(rename = "ingredient", alias = "ingredients")]
    pub ingredients: Option<Vec<AttrPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    pub fn tag_ids(&self) -> Result<Vec<i64>, String> {
        parse_id_list("tags", self.tags.as_deref())
    }

    pub fn ingredient_ids(&self) -> Result<Vec<i64>, String> {
        parse_id_list("ingredients", self.ingredients.as_deref())
    }
}

/// Validated recipe ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub description: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Validated changes to an existing recipe. `None` leaves the column or
/// association untouched; `Some(vec![])` clears the association.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

/// Id filters for the recipe list. An empty list means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// Parses a comma separated id list such as `1,2,3`. Empty segments are skipped.
fn parse_id_list(field: &str, raw: Option<&str>) -> Result<Vec<i64>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| format!("{}: '{}' is not a valid id", field, s))
        })
        .collect()
}
