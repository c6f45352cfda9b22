//! Domain service for accounts and token authentication.
//!
//! Handles registration, token issuance, request authentication and
//! profile updates.

use serde::Serialize;
use thiserror::Error;

use crate::domain::FieldErrors;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email/password pair when requesting a token.
    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(String),

    /// Missing, unknown or inactive token.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// The identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_staff: bool,
}

/// Public account fields.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a regular account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for an empty email or short password
    /// and [`AuthError::EmailTaken`] when the normalized email exists.
    async fn register(&self, registration: Registration) -> Result<UserInfo, AuthError>;

    /// Exchanges credentials for the account's API token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the credentials do not match.
    async fn issue_token(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Resolves a bearer token to the active account it belongs to.
    async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError>;

    /// Gets the public fields of an account.
    async fn get_user_info(&self, user_id: i32) -> Result<UserInfo, AuthError>;

    /// Changes display name and/or password.
    async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<UserInfo, AuthError>;
}
