use crate::{auth, handlers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Builds the full application router: user endpoints, token-protected
/// recipe endpoints, and the read-only media mount.
pub fn app_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/user/create/", post(auth::handlers::create_user_handler))
        .route("/api/user/token/", post(auth::handlers::create_token_handler));

    let protected_routes = Router::new()
        .route(
            "/api/user/me/",
            get(auth::handlers::me_handler)
                .put(auth::handlers::update_me_handler)
                .patch(auth::handlers::partial_update_me_handler),
        )
        // Recipe routes
        .route(
            "/api/recipe/recipes/",
            get(handlers::list_recipes_handler).post(handlers::create_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/{id}/",
            get(handlers::get_recipe_handler)
                .put(handlers::update_recipe_handler)
                .patch(handlers::partial_update_recipe_handler)
                .delete(handlers::delete_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/{id}/upload-image/",
            post(handlers::upload_recipe_image_handler),
        )
        // Tag routes
        .route("/api/recipe/tags/", get(handlers::list_tags_handler))
        .route(
            "/api/recipe/tags/{id}/",
            put(handlers::update_tag_handler)
                .patch(handlers::partial_update_tag_handler)
                .delete(handlers::delete_tag_handler),
        )
        // Ingredient routes
        .route(
            "/api/recipe/ingredients/",
            get(handlers::list_ingredients_handler),
        )
        .route(
            "/api/recipe/ingredients/{id}/",
            put(handlers::update_ingredient_handler)
                .patch(handlers::partial_update_ingredient_handler)
                .delete(handlers::delete_ingredient_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    let media = ServeDir::new(&state.config.media_root);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service(&state.config.media_url, media)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .with_state(state)
}
