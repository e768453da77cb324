pub mod recipe_attr_handlers;
pub mod recipe_handlers;

pub use recipe_attr_handlers::*;
pub use recipe_handlers::*;
