use crate::auth::CurrentUser;
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{AttrKind, AttrListQuery, RecipeAttr, UpdateAttrRequest};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};

async fn list(
    state: &AppState,
    kind: AttrKind,
    user_id: i64,
    query: AttrListQuery,
) -> Result<Json<Vec<RecipeAttr>>> {
    let attrs = state
        .recipe_attr_service
        .list(kind, user_id, &query)
        .await?;
    Ok(Json(attrs))
}

async fn update(
    state: &AppState,
    kind: AttrKind,
    id: i64,
    user_id: i64,
    request: UpdateAttrRequest,
    partial: bool,
) -> Result<Json<RecipeAttr>> {
    let attr = state
        .recipe_attr_service
        .update(kind, id, user_id, request, partial)
        .await?;
    Ok(Json(attr))
}

async fn delete(state: &AppState, kind: AttrKind, id: i64, user_id: i64) -> Result<StatusCode> {
    state.recipe_attr_service.delete(kind, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Tags

/// GET /api/recipe/tags/
pub async fn list_tags_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<AttrListQuery>,
) -> Result<Json<Vec<RecipeAttr>>> {
    list(&state, AttrKind::Tag, user.id, query).await
}

/// PUT /api/recipe/tags/{id}/
pub async fn update_tag_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateAttrRequest>,
) -> Result<Json<RecipeAttr>> {
    update(&state, AttrKind::Tag, id, user.id, request, false).await
}

/// PATCH /api/recipe/tags/{id}/
pub async fn partial_update_tag_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateAttrRequest>,
) -> Result<Json<RecipeAttr>> {
    update(&state, AttrKind::Tag, id, user.id, request, true).await
}

/// DELETE /api/recipe/tags/{id}/
pub async fn delete_tag_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    delete(&state, AttrKind::Tag, id, user.id).await
}

// Ingredients

/// GET /api/recipe/ingredients/
pub async fn list_ingredients_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<AttrListQuery>,
) -> Result<Json<Vec<RecipeAttr>>> {
    list(&state, AttrKind::Ingredient, user.id, query).await
}

/// PUT /api/recipe/ingredients/{id}/
pub async fn update_ingredient_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateAttrRequest>,
) -> Result<Json<RecipeAttr>> {
    update(&state, AttrKind::Ingredient, id, user.id, request, false).await
}

/// PATCH /api/recipe/ingredients/{id}/
pub async fn partial_update_ingredient_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateAttrRequest>,
) -> Result<Json<RecipeAttr>> {
    update(&state, AttrKind::Ingredient, id, user.id, request, true).await
}

/// DELETE /api/recipe/ingredients/{id}/
pub async fn delete_ingredient_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    delete(&state, AttrKind::Ingredient, id, user.id).await
}
