use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Tags and ingredients share one shape; only their tables differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Tag,
    Ingredient,
}

impl AttrKind {
    pub fn table(self) -> &'static str {
        match self {
            AttrKind::Tag => "tags",
            AttrKind::Ingredient => "ingredients",
        }
    }

    pub fn join_table(self) -> &'static str {
        match self {
            AttrKind::Tag => "recipe_tags",
            AttrKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Column in the join table that points at this kind's table.
    pub fn join_column(self) -> &'static str {
        match self {
            AttrKind::Tag => "tag_id",
            AttrKind::Ingredient => "ingredient_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttrKind::Tag => "Tag",
            AttrKind::Ingredient => "Ingredient",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeAttr {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
}

pub type Tag = RecipeAttr;
pub type Ingredient = RecipeAttr;

impl fmt::Display for RecipeAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Nested `{ "name": ... }` object inside a recipe payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrPayload {
    #[serde(default)]
    pub name: String,
}

impl AttrPayload {
    pub fn new(name: impl Into<String>) -> Self {
        AttrPayload { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAttrRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttrListQuery {
    pub assigned_only: Option<i64>,
}

impl AttrListQuery {
    pub fn assigned_only(&self) -> bool {
        self.assigned_only.unwrap_or(0) != 0
    }
}
