use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::validation::parse_authorization;
use super::{ApiError, AppState};
use crate::services::{AuthError, AuthUser};

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware. Accepts the account token from:
/// 1. `Authorization: Bearer <token>` or `Authorization: Token <token>`
/// 2. `X-Api-Key` header
///
/// On success the resolved [`AuthUser`] is inserted into the request
/// extensions for handlers to extract, and into the response extensions so
/// request tracking can tell authenticated calls apart.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&headers) else {
        return Err(ApiError::unauthorized());
    };

    let user = match state.auth_service().authenticate(&token).await {
        Ok(user) => user,
        Err(AuthError::Unauthorized) => return Err(ApiError::unauthorized()),
        Err(e) => return Err(e.into()),
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Extract the token from headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = parse_authorization(auth_str)
    {
        return Some(token.to_string());
    }

    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
        && !key_str.trim().is_empty()
    {
        return Some(key_str.trim().to_string());
    }

    None
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::InvalidFields(
                crate::domain::FieldErrors::single("non_field_errors", err.to_string()),
            ),
            AuthError::Validation(fields) => Self::InvalidFields(fields),
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::UserNotFound | AuthError::Unauthorized => Self::unauthorized(),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// Convenience alias for handlers that need the caller's identity.
pub type CurrentUser = axum::Extension<AuthUser>;
