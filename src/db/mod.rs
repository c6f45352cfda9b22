use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{AttributeKind, RecipeFilter};

pub mod migrator;
pub mod repositories;

pub use repositories::attribute::Attribute;
pub use repositories::recipe::{ImageReplacement, NestedNames, NewRecipe, Recipe, RecipeChanges};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Applies pending migrations without opening a full pool.
    pub async fn migrate(db_url: &str) -> Result<()> {
        Self::with_pool_options(db_url, 1, 1).await.map(|_| ())
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::attribute::TagRepository {
        repositories::attribute::TagRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::attribute::IngredientRepository {
        repositories::attribute::IngredientRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, new_user: NewUser<'_>, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        name: Option<&str>,
        new_password: Option<&str>,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .update_profile(id, name, new_password, security)
            .await
    }

    // ========================================================================
    // Recipes
    // ========================================================================

    pub async fn list_recipes(&self, owner_id: i32, filter: &RecipeFilter) -> Result<Vec<Recipe>> {
        self.recipe_repo().list(owner_id, filter).await
    }

    pub async fn get_recipe(&self, owner_id: i32, id: i32) -> Result<Option<Recipe>> {
        self.recipe_repo().get(owner_id, id).await
    }

    pub async fn create_recipe(
        &self,
        owner_id: i32,
        recipe: NewRecipe,
        nested: NestedNames,
    ) -> Result<Recipe> {
        self.recipe_repo().create(owner_id, recipe, nested).await
    }

    pub async fn update_recipe(
        &self,
        owner_id: i32,
        id: i32,
        changes: RecipeChanges,
        nested: NestedNames,
    ) -> Result<Option<Recipe>> {
        self.recipe_repo().update(owner_id, id, changes, nested).await
    }

    pub async fn delete_recipe(&self, owner_id: i32, id: i32) -> Result<Option<Option<String>>> {
        self.recipe_repo().delete(owner_id, id).await
    }

    pub async fn set_recipe_image(
        &self,
        owner_id: i32,
        id: i32,
        image_path: &str,
    ) -> Result<Option<ImageReplacement>> {
        self.recipe_repo().set_image(owner_id, id, image_path).await
    }

    // ========================================================================
    // Tags & ingredients
    // ========================================================================

    pub async fn list_attributes(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<Attribute>> {
        match kind {
            AttributeKind::Tag => self.tag_repo().list(owner_id, assigned_only).await,
            AttributeKind::Ingredient => self.ingredient_repo().list(owner_id, assigned_only).await,
        }
    }

    pub async fn get_attribute(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        id: i32,
    ) -> Result<Option<Attribute>> {
        match kind {
            AttributeKind::Tag => self.tag_repo().get(owner_id, id).await,
            AttributeKind::Ingredient => self.ingredient_repo().get(owner_id, id).await,
        }
    }

    pub async fn find_attribute_by_name(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        name: &str,
    ) -> Result<Option<Attribute>> {
        match kind {
            AttributeKind::Tag => self.tag_repo().find_by_name(owner_id, name).await,
            AttributeKind::Ingredient => self.ingredient_repo().find_by_name(owner_id, name).await,
        }
    }

    pub async fn rename_attribute(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<Attribute>> {
        match kind {
            AttributeKind::Tag => self.tag_repo().rename(owner_id, id, name).await,
            AttributeKind::Ingredient => self.ingredient_repo().rename(owner_id, id, name).await,
        }
    }

    pub async fn delete_attribute(&self, kind: AttributeKind, owner_id: i32, id: i32) -> Result<bool> {
        match kind {
            AttributeKind::Tag => self.tag_repo().delete(owner_id, id).await,
            AttributeKind::Ingredient => self.ingredient_repo().delete(owner_id, id).await,
        }
    }

    /// Resolves names to the owner's rows, creating the missing ones.
    #[cfg(test)]
    pub async fn get_or_create_attributes(
        &self,
        kind: AttributeKind,
        owner_id: i32,
        names: &[String],
    ) -> Result<Vec<Attribute>> {
        use repositories::attribute::{IngredientRepository, TagRepository};
        use sea_orm::TransactionTrait;

        let txn = self.conn.begin().await?;
        let rows = match kind {
            AttributeKind::Tag => TagRepository::get_or_create(&txn, owner_id, names).await?,
            AttributeKind::Ingredient => {
                IngredientRepository::get_or_create(&txn, owner_id, names).await?
            }
        };
        txn.commit().await?;
        Ok(rows)
    }
}
