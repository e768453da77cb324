use super::middleware::CurrentUser;
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::models::{
    CreateUserPayload, TokenPayload, TokenResponse, UpdateUserPayload, UserProfile,
};
use crate::services::{CreateUserRequest, LoginRequest, UpdateProfileRequest};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};

/// POST /api/user/create/ - Register a new user
pub async fn create_user_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    let user = state
        .user_service
        .register(CreateUserRequest {
            email: payload.email,
            password: payload.password,
            name: payload.name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

/// POST /api/user/token/ - Exchange credentials for an API token
pub async fn create_token_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenPayload>,
) -> Result<Json<TokenResponse>> {
    let user = state
        .auth_service
        .authenticate(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await
        .map_err(AppError::from)?;

    let token = state
        .auth_service
        .issue_token(&user)
        .await
        .map_err(AppError::from)?;

    Ok(Json(TokenResponse { token }))
}

/// GET /api/user/me/ - Profile of the authenticated user
pub async fn me_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(user.into())
}

/// PUT /api/user/me/ - Replace profile; email and password are required
pub async fn update_me_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<UpdateUserPayload>,
) -> Result<Json<UserProfile>> {
    if payload.email.is_none() {
        return Err(AppError::Validation(
            "email: This field is required.".to_string(),
        ));
    }
    if payload.password.is_none() {
        return Err(AppError::Validation(
            "password: This field is required.".to_string(),
        ));
    }

    apply_profile_update(&state, user.id, payload).await
}

/// PATCH /api/user/me/ - Update any subset of email, password and name
pub async fn partial_update_me_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<UpdateUserPayload>,
) -> Result<Json<UserProfile>> {
    apply_profile_update(&state, user.id, payload).await
}

async fn apply_profile_update(
    state: &AppState,
    user_id: i64,
    payload: UpdateUserPayload,
) -> Result<Json<UserProfile>> {
    let updated = state
        .user_service
        .update_profile(UpdateProfileRequest {
            user_id,
            email: payload.email,
            password: payload.password,
            name: payload.name,
        })
        .await?;

    Ok(Json(updated.into()))
}
