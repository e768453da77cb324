use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{RecipeDetail, RecipeImage, RecipeListQuery, RecipePayload, RecipeSummary};
use crate::services::WriteMode;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

/// Multipart field carrying the uploaded file.
const IMAGE_FIELD: &str = "image";

/// GET /api/recipe/recipes/ - List the user's recipes, newest first
pub async fn list_recipes_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<RecipeListQuery>,
) -> Result<Json<Vec<RecipeSummary>>> {
    let recipes = state.recipe_service.list(user.id, &query).await?;
    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

/// POST /api/recipe/recipes/ - Create a recipe with nested tags/ingredients
pub async fn create_recipe_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<impl IntoResponse> {
    let recipe = state.recipe_service.create(user.id, payload).await?;
    let detail = RecipeDetail::from_recipe(recipe, &state.config.media_url);
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/recipe/recipes/{id}/ - Recipe detail
pub async fn get_recipe_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RecipeDetail>> {
    let recipe = state.recipe_service.get(id, user.id).await?;
    Ok(Json(RecipeDetail::from_recipe(
        recipe,
        &state.config.media_url,
    )))
}

/// PUT /api/recipe/recipes/{id}/ - Full update
pub async fn update_recipe_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<Json<RecipeDetail>> {
    write_recipe(&state, id, user.id, payload, WriteMode::Full).await
}

/// PATCH /api/recipe/recipes/{id}/ - Partial update
pub async fn partial_update_recipe_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<Json<RecipeDetail>> {
    write_recipe(&state, id, user.id, payload, WriteMode::Partial).await
}

async fn write_recipe(
    state: &AppState,
    id: i64,
    user_id: i64,
    payload: RecipePayload,
    mode: WriteMode,
) -> Result<Json<RecipeDetail>> {
    let recipe = state
        .recipe_service
        .update(id, user_id, payload, mode)
        .await?;
    Ok(Json(RecipeDetail::from_recipe(
        recipe,
        &state.config.media_url,
    )))
}

/// DELETE /api/recipe/recipes/{id}/
pub async fn delete_recipe_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.recipe_service.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/recipe/recipes/{id}/upload-image/ - Multipart `image` upload
pub async fn upload_recipe_image_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    mut multipart: Multipart,
) -> Result<Json<RecipeImage>> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("image: {}", e)))?;
            image = Some(bytes);
            break;
        }
    }

    let bytes = image.ok_or_else(|| {
        AppError::Validation("image: No file was submitted.".to_string())
    })?;

    let recipe = state
        .recipe_service
        .upload_image(id, user.id, &bytes)
        .await?;

    Ok(Json(RecipeImage::from_recipe(
        &recipe,
        &state.config.media_url,
    )))
}
