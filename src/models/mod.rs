pub mod recipe;
pub mod recipe_attr;
pub mod user;

pub use recipe::{
    NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeFilter, RecipeImage, RecipeListQuery,
    RecipePayload, RecipeRow, RecipeSummary,
};
pub use recipe_attr::{
    AttrKind, AttrListQuery, AttrPayload, Ingredient, RecipeAttr, Tag, UpdateAttrRequest,
};
pub use user::{
    CreateUserPayload, TokenPayload, TokenResponse, UpdateUserPayload, User, UserProfile,
};
