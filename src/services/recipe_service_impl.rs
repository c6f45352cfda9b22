//! `SeaORM` implementation of the `RecipeService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::{Recipe, Store};
use crate::domain::{FieldErrors, RecipeFilter};
use crate::services::image::ImageService;
use crate::services::recipe_service::{
    PreparedRecipe, RecipeError, RecipeInput, RecipeService, WriteMode,
};

pub struct SeaOrmRecipeService {
    store: Store,
    images: Arc<ImageService>,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }
}

fn log_ignored_owner_change(owner_id: i32, input: &RecipeInput) {
    if input.tries_to_change_owner() {
        debug!(owner_id, "Ignoring owner field in recipe payload");
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(&self, owner_id: i32, filter: &RecipeFilter) -> Result<Vec<Recipe>, RecipeError> {
        Ok(self.store.list_recipes(owner_id, filter).await?)
    }

    async fn get(&self, owner_id: i32, id: i32) -> Result<Recipe, RecipeError> {
        self.store
            .get_recipe(owner_id, id)
            .await?
            .ok_or(RecipeError::NotFound(id))
    }

    async fn create(&self, owner_id: i32, input: RecipeInput) -> Result<Recipe, RecipeError> {
        log_ignored_owner_change(owner_id, &input);

        let (recipe, nested) =
            PreparedRecipe::from_input(input, WriteMode::Create)?.into_new()?;

        let created = self.store.create_recipe(owner_id, recipe, nested).await?;
        info!(recipe_id = created.id, owner_id, "Recipe created");
        Ok(created)
    }

    async fn update(
        &self,
        owner_id: i32,
        id: i32,
        input: RecipeInput,
        mode: WriteMode,
    ) -> Result<Recipe, RecipeError> {
        log_ignored_owner_change(owner_id, &input);

        let prepared = PreparedRecipe::from_input(input, mode)?;

        self.store
            .update_recipe(owner_id, id, prepared.changes, prepared.nested)
            .await?
            .ok_or(RecipeError::NotFound(id))
    }

    async fn delete(&self, owner_id: i32, id: i32) -> Result<(), RecipeError> {
        let image = self
            .store
            .delete_recipe(owner_id, id)
            .await?
            .ok_or(RecipeError::NotFound(id))?;

        if let Some(path) = image {
            self.images.remove(&path).await;
        }

        info!(recipe_id = id, owner_id, "Recipe deleted");
        Ok(())
    }

    async fn upload_image(
        &self,
        owner_id: i32,
        id: i32,
        bytes: &[u8],
    ) -> Result<Recipe, RecipeError> {
        // Ownership first so a foreign id never touches the filesystem.
        if self.store.get_recipe(owner_id, id).await?.is_none() {
            return Err(RecipeError::NotFound(id));
        }

        let format = self.images.inspect(bytes.to_vec()).await?.ok_or_else(|| {
            FieldErrors::single(
                "image",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            )
        })?;

        let stored = self.images.save_recipe_image(bytes, format).await?;

        let Some(replacement) = self.store.set_recipe_image(owner_id, id, &stored).await? else {
            self.images.remove(&stored).await;
            return Err(RecipeError::NotFound(id));
        };

        if let Some(previous) = replacement.previous.as_deref()
            && previous != stored
        {
            self.images.remove(previous).await;
        }

        Ok(replacement.recipe)
    }
}
