//! Domain service for the per-user tag and ingredient registries.

use thiserror::Error;

use crate::db::Attribute;
use crate::domain::{AttributeFilter, AttributeKind, FieldErrors};

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("{kind} {id} not found")]
    NotFound { kind: AttributeKind, id: i32 },

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AttributeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AttributeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for AttributeError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

#[async_trait::async_trait]
pub trait AttributeService: Send + Sync {
    /// Owner's rows of `kind`, ordered by name descending.
    async fn list(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        filter: AttributeFilter,
    ) -> Result<Vec<Attribute>, AttributeError>;

    /// Renames one of the owner's rows.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Validation`] for a blank or taken name and
    /// [`AttributeError::NotFound`] for ids the owner does not have.
    async fn rename(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Attribute, AttributeError>;

    /// Deletes one of the owner's rows; linked recipes lose the link only.
    async fn delete(&self, kind: AttributeKind, owner_id: i32, id: i32) -> Result<(), AttributeError>;
}
