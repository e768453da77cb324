pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use config::AppConfig;
use repositories::{
    SqliteRecipeAttrRepository, SqliteRecipeRepository, SqliteTokenRepository,
    SqliteUserRepository,
};
use services::{AuthService, MediaStorage, RecipeAttrService, RecipeService, UserService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub recipe_service: Arc<RecipeService>,
    pub recipe_attr_service: Arc<RecipeAttrService>,
}

impl AppState {
    /// Wires the SQLite repositories and services over one pool.
    pub fn new(pool: sqlx::SqlitePool, config: AppConfig) -> Self {
        // Initialize repositories
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let token_repository = Arc::new(SqliteTokenRepository::new(pool.clone()));
        let recipe_repository = Arc::new(SqliteRecipeRepository::new(pool.clone()));
        let recipe_attr_repository = Arc::new(SqliteRecipeAttrRepository::new(pool));

        // Initialize services
        let user_service = Arc::new(UserService::new(user_repository.clone()));
        let auth_service = Arc::new(AuthService::new(user_repository, token_repository));
        let recipe_service = Arc::new(RecipeService::new(
            recipe_repository,
            MediaStorage::new(config.media_root.clone()),
        ));
        let recipe_attr_service = Arc::new(RecipeAttrService::new(recipe_attr_repository));

        AppState {
            config: Arc::new(config),
            user_service,
            auth_service,
            recipe_service,
            recipe_attr_service,
        }
    }
}
