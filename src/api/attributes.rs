//! Tag and ingredient endpoints. Both resources share these handlers; the
//! router binds each one to its [`AttributeKind`].

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::error::{ApiJson, ApiPath, ApiQuery};
use super::validation::validate_resource_id;
use super::{ApiError, ApiResponse, AppState, AttributeDto};
use crate::domain::{AttributeFilter, AttributeKind};
use crate::services::AttributeError;

impl From<AttributeError> for ApiError {
    fn from(err: AttributeError) -> Self {
        match err {
            AttributeError::NotFound { kind, id } => Self::not_found(&kind.to_string(), id),
            AttributeError::Validation(fields) => Self::InvalidFields(fields),
            AttributeError::Database(msg) => Self::DatabaseError(msg),
            AttributeError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AttributeListQuery {
    pub assigned_only: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub name: String,
}

/// GET /tags, GET /ingredients
pub async fn list(
    kind: AttributeKind,
    state: Arc<AppState>,
    owner_id: i32,
    query: AttributeListQuery,
) -> Result<Json<ApiResponse<Vec<AttributeDto>>>, ApiError> {
    let filter = AttributeFilter::from_params(query.assigned_only.as_deref())?;

    let rows = state.attribute_service().list(kind, owner_id, filter).await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(AttributeDto::from).collect(),
    )))
}

/// PATCH|PUT /tags/{id}, PATCH|PUT /ingredients/{id}
pub async fn rename(
    kind: AttributeKind,
    state: Arc<AppState>,
    owner_id: i32,
    id: i32,
    payload: RenameRequest,
) -> Result<Json<ApiResponse<AttributeDto>>, ApiError> {
    let id = validate_resource_id(&kind.to_string(), id)?;

    let row = state
        .attribute_service()
        .rename(kind, owner_id, id, &payload.name)
        .await?;

    Ok(Json(ApiResponse::success(AttributeDto::from(row))))
}

/// DELETE /tags/{id}, DELETE /ingredients/{id}
pub async fn delete(
    kind: AttributeKind,
    state: Arc<AppState>,
    owner_id: i32,
    id: i32,
) -> Result<StatusCode, ApiError> {
    let id = validate_resource_id(&kind.to_string(), id)?;
    state.attribute_service().delete(kind, owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

macro_rules! attribute_handlers {
    ($module:ident, $kind:expr) => {
        pub mod $module {
            use super::*;

            pub async fn list(
                State(state): State<Arc<AppState>>,
                Extension(user): CurrentUser,
                ApiQuery(query): ApiQuery<AttributeListQuery>,
            ) -> Result<Json<ApiResponse<Vec<AttributeDto>>>, ApiError> {
                super::list($kind, state, user.id, query).await
            }

            pub async fn rename(
                State(state): State<Arc<AppState>>,
                Extension(user): CurrentUser,
                ApiPath(id): ApiPath<i32>,
                ApiJson(payload): ApiJson<RenameRequest>,
            ) -> Result<Json<ApiResponse<AttributeDto>>, ApiError> {
                super::rename($kind, state, user.id, id, payload).await
            }

            pub async fn delete(
                State(state): State<Arc<AppState>>,
                Extension(user): CurrentUser,
                ApiPath(id): ApiPath<i32>,
            ) -> Result<StatusCode, ApiError> {
                super::delete($kind, state, user.id, id).await
            }
        }
    };
}

attribute_handlers!(tags, AttributeKind::Tag);
attribute_handlers!(ingredients, AttributeKind::Ingredient);
