//! Recipe endpoints. Every handler is scoped to the authenticated caller.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::error::{ApiJson, ApiPath, ApiQuery};
use super::validation::{validate_image_upload, validate_resource_id};
use super::{ApiError, ApiResponse, AppState, RecipeDetailDto, RecipeDto, RecipeImageDto};
use crate::domain::{FieldErrors, RecipeFilter};
use crate::services::{RecipeError, RecipeInput, WriteMode};

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NotFound(id) => Self::not_found("Recipe", id),
            RecipeError::Validation(fields) => Self::InvalidFields(fields),
            RecipeError::Database(msg) => Self::DatabaseError(msg),
            RecipeError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// GET /recipes?tags=1,2&ingredients=3
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiQuery(query): ApiQuery<RecipeListQuery>,
) -> Result<Json<ApiResponse<Vec<RecipeDto>>>, ApiError> {
    let filter = RecipeFilter::from_params(query.tags.as_deref(), query.ingredients.as_deref())?;

    let recipes = state.recipe_service().list(user.id, &filter).await?;

    Ok(Json(ApiResponse::success(
        recipes.into_iter().map(RecipeDto::from).collect(),
    )))
}

/// POST /recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiJson(payload): ApiJson<RecipeInput>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeDto>>), ApiError> {
    let recipe = state.recipe_service().create(user.id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RecipeDto::from(recipe))),
    ))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let id = validate_resource_id("Recipe", id)?;
    let recipe = state.recipe_service().get(user.id, id).await?;
    Ok(Json(ApiResponse::success(RecipeDetailDto::from(recipe))))
}

/// PUT /recipes/{id}
pub async fn replace_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<RecipeInput>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    update(&state, user.id, id, payload, WriteMode::Replace).await
}

/// PATCH /recipes/{id}
pub async fn patch_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<RecipeInput>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    update(&state, user.id, id, payload, WriteMode::Partial).await
}

async fn update(
    state: &AppState,
    owner_id: i32,
    id: i32,
    payload: RecipeInput,
    mode: WriteMode,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let id = validate_resource_id("Recipe", id)?;
    let recipe = state
        .recipe_service()
        .update(owner_id, id, payload, mode)
        .await?;
    Ok(Json(ApiResponse::success(RecipeDto::from(recipe))))
}

/// DELETE /recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_resource_id("Recipe", id)?;
    state.recipe_service().delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/upload-image
/// Multipart upload with the file in the `image` field.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(user): CurrentUser,
    ApiPath(id): ApiPath<i32>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<RecipeImageDto>>, ApiError> {
    let id = validate_resource_id("Recipe", id)?;
    let mut multipart = multipart?;

    let mut image: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            image = Some(field.bytes().await?);
        }
    }

    let image = image.ok_or_else(|| FieldErrors::single("image", "No file was submitted."))?;
    let max_bytes = state.config().read().await.uploads.max_image_bytes;
    validate_image_upload(&image, max_bytes)?;

    let recipe = state
        .recipe_service()
        .upload_image(user.id, id, &image)
        .await?;

    Ok(Json(ApiResponse::success(RecipeImageDto::from(recipe))))
}
