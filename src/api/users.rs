//! Account endpoints: registration, token exchange and the caller's profile.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::error::ApiJson;
use super::{ApiError, ApiResponse, AppState, TokenDto, UserDto};
use crate::services::{ProfileUpdate, Registration};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// POST /user/create
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state
        .auth_service()
        .register(Registration {
            email: payload.email,
            password: payload.password,
            name: payload.name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// POST /user/token
/// Exchange email and password for the account's API token.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let token = state
        .auth_service()
        .issue_token(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(TokenDto { token })))
}

/// GET /user/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let info = state.auth_service().get_user_info(user.id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(info))))
}

/// PATCH /user/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateMeRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let info = state
        .auth_service()
        .update_profile(
            user.id,
            ProfileUpdate {
                name: payload.name,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(info))))
}
