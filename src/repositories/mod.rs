pub mod recipe_attr_repository;
pub mod recipe_repository;
pub mod token_repository;
pub mod user_repository;

pub use recipe_attr_repository::{RecipeAttrRepository, SqliteRecipeAttrRepository};
pub use recipe_repository::{RecipeRepository, SqliteRecipeRepository};
pub use token_repository::{SqliteTokenRepository, TokenRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

/// True when the error comes from a UNIQUE constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}
