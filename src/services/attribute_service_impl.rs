//! `SeaORM` implementation of the `AttributeService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Attribute, Store};
use crate::domain::{AttributeFilter, AttributeKind, FieldErrors};
use crate::services::attribute_service::{AttributeError, AttributeService};

const MAX_NAME_LENGTH: usize = 255;

pub struct SeaOrmAttributeService {
    store: Store,
}

impl SeaOrmAttributeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn check_name(name: &str) -> Result<&str, FieldErrors> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FieldErrors::single("name", "This field may not be blank."));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(FieldErrors::single(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        ));
    }
    Ok(name)
}

#[async_trait]
impl AttributeService for SeaOrmAttributeService {
    async fn list(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        filter: AttributeFilter,
    ) -> Result<Vec<Attribute>, AttributeError> {
        Ok(self
            .store
            .list_attributes(kind, owner_id, filter.assigned_only)
            .await?)
    }

    async fn rename(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Attribute, AttributeError> {
        let name = check_name(name)?;

        let current = self
            .store
            .get_attribute(kind, owner_id, id)
            .await?
            .ok_or(AttributeError::NotFound { kind, id })?;

        if current.name == name {
            return Ok(current);
        }

        if self
            .store
            .find_attribute_by_name(kind, owner_id, name)
            .await?
            .is_some()
        {
            return Err(FieldErrors::single(
                "name",
                format!("A {} with this name already exists.", kind.as_str()),
            )
            .into());
        }

        let renamed = self
            .store
            .rename_attribute(kind, owner_id, id, name)
            .await?
            .ok_or(AttributeError::NotFound { kind, id })?;

        info!(kind = kind.as_str(), id, owner_id, "Renamed");
        Ok(renamed)
    }

    async fn delete(&self, kind: AttributeKind, owner_id: i32, id: i32) -> Result<(), AttributeError> {
        if !self.store.delete_attribute(kind, owner_id, id).await? {
            return Err(AttributeError::NotFound { kind, id });
        }

        info!(kind = kind.as_str(), id, owner_id, "Deleted");
        Ok(())
    }
}
