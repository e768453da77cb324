pub mod auth_service;
pub mod media_service;
pub mod recipe_attr_service;
pub mod recipe_service;
pub mod user_service;

pub use auth_service::{AuthService, AuthServiceError, LoginRequest};
pub use media_service::{MediaError, MediaStorage};
pub use recipe_attr_service::RecipeAttrService;
pub use recipe_service::{RecipeService, WriteMode};
pub use user_service::{CreateUserRequest, UpdateProfileRequest, UserService, UserServiceError};
