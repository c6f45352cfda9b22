use anyhow::{Context, Result};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::debug;

use super::attribute::{Attribute, IngredientRepository, TagRepository};
use crate::domain::{Price, RecipeFilter};
use crate::entities::{prelude::*, recipe_ingredients, recipe_tags, recipes};

/// A recipe with its tags and ingredients resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// Scalar changes for an update. `None` leaves the column untouched; for the
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub description: Option<Option<String>>,
    pub link: Option<Option<String>>,
}

/// Desired tag and ingredient names. `None` keeps the current links,
/// `Some(vec![])` removes them all.
#[derive(Debug, Clone, Default)]
pub struct NestedNames {
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

/// Outcome of swapping a recipe's image path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReplacement {
    pub recipe: Recipe,
    pub previous: Option<String>,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Owner's recipes, newest id first. Each filter axis keeps recipes
    /// linked to any of its ids; axes combine with AND. A recipe appears once.
    pub async fn list(&self, owner_id: i32, filter: &RecipeFilter) -> Result<Vec<Recipe>> {
        let mut query = Recipes::find().filter(recipes::Column::UserId.eq(owner_id));

        if let Some(tag_ids) = &filter.tag_ids {
            query = query.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_tags::Column::RecipeId)
                        .from(RecipeTags)
                        .and_where(recipe_tags::Column::TagId.is_in(tag_ids.iter().copied()))
                        .to_owned(),
                ),
            );
        }

        if let Some(ingredient_ids) = &filter.ingredient_ids {
            query = query.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_ingredients::Column::RecipeId)
                        .from(RecipeIngredients)
                        .and_where(
                            recipe_ingredients::Column::IngredientId
                                .is_in(ingredient_ids.iter().copied()),
                        )
                        .to_owned(),
                ),
            );
        }

        let rows = query
            .order_by_desc(recipes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list recipes")?;

        hydrate(&self.conn, rows).await
    }

    pub async fn get(&self, owner_id: i32, id: i32) -> Result<Option<Recipe>> {
        let Some(row) = find_owned(&self.conn, owner_id, id).await? else {
            return Ok(None);
        };

        Ok(hydrate(&self.conn, vec![row]).await?.into_iter().next())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Inserts the recipe and links its tags and ingredients, creating any
    /// missing ones for the owner. All-or-nothing.
    pub async fn create(&self, owner_id: i32, recipe: NewRecipe, nested: NestedNames) -> Result<Recipe> {
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        let row = recipes::ActiveModel {
            user_id: Set(owner_id),
            title: Set(recipe.title),
            time_minutes: Set(recipe.time_minutes),
            price_cents: Set(recipe.price.cents()),
            description: Set(recipe.description),
            link: Set(recipe.link),
            image: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        reconcile_nested(&txn, owner_id, row.id, &nested).await?;

        let recipe = hydrate(&txn, vec![row])
            .await?
            .into_iter()
            .next()
            .context("Inserted recipe vanished")?;

        txn.commit().await?;
        debug!(recipe_id = recipe.id, owner_id, "Recipe created");
        Ok(recipe)
    }

    /// Applies the given changes. Returns `None` if the recipe does not
    /// exist or is not owned by `owner_id`.
    pub async fn update(
        &self,
        owner_id: i32,
        id: i32,
        changes: RecipeChanges,
        nested: NestedNames,
    ) -> Result<Option<Recipe>> {
        let txn = self.conn.begin().await?;

        let Some(row) = find_owned(&txn, owner_id, id).await? else {
            return Ok(None);
        };

        let mut active: recipes::ActiveModel = row.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(time_minutes) = changes.time_minutes {
            active.time_minutes = Set(time_minutes);
        }
        if let Some(price) = changes.price {
            active.price_cents = Set(price.cents());
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(link) = changes.link {
            active.link = Set(link);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let row = active.update(&txn).await.context("Failed to update recipe")?;

        reconcile_nested(&txn, owner_id, row.id, &nested).await?;

        let recipe = hydrate(&txn, vec![row]).await?.into_iter().next();
        txn.commit().await?;
        Ok(recipe)
    }

    /// Deletes the recipe and its links. Returns the stored image path of the
    /// removed recipe, or `None` if nothing owned by `owner_id` matched.
    pub async fn delete(&self, owner_id: i32, id: i32) -> Result<Option<Option<String>>> {
        let txn = self.conn.begin().await?;

        let Some(row) = find_owned(&txn, owner_id, id).await? else {
            return Ok(None);
        };

        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(row.id))
            .exec(&txn)
            .await?;
        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(row.id))
            .exec(&txn)
            .await?;
        Recipes::delete_by_id(row.id).exec(&txn).await?;

        txn.commit().await?;
        debug!(recipe_id = id, owner_id, "Recipe deleted");
        Ok(Some(row.image))
    }

    /// Points the recipe at a newly stored image and hands back the path it
    /// replaced.
    pub async fn set_image(
        &self,
        owner_id: i32,
        id: i32,
        image_path: &str,
    ) -> Result<Option<ImageReplacement>> {
        let Some(row) = find_owned(&self.conn, owner_id, id).await? else {
            return Ok(None);
        };

        let previous = row.image.clone();
        let mut active: recipes::ActiveModel = row.into();
        active.image = Set(Some(image_path.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let row = active
            .update(&self.conn)
            .await
            .context("Failed to update recipe image")?;

        let recipe = hydrate(&self.conn, vec![row])
            .await?
            .into_iter()
            .next()
            .context("Updated recipe vanished")?;

        Ok(Some(ImageReplacement { recipe, previous }))
    }
}

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    id: i32,
) -> Result<Option<recipes::Model>> {
    Recipes::find_by_id(id)
        .filter(recipes::Column::UserId.eq(owner_id))
        .one(conn)
        .await
        .context("Failed to query recipe")
}

/// Replaces the link sets named in `nested`, creating unknown names for the
/// recipe owner.
async fn reconcile_nested<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    recipe_id: i32,
    nested: &NestedNames,
) -> Result<()> {
    if let Some(names) = &nested.tags {
        let tags = TagRepository::get_or_create(conn, owner_id, names).await?;
        let ids: Vec<i32> = tags.iter().map(|t| t.id).collect();
        TagRepository::replace_links(conn, recipe_id, &ids).await?;
    }

    if let Some(names) = &nested.ingredients {
        let ingredients = IngredientRepository::get_or_create(conn, owner_id, names).await?;
        let ids: Vec<i32> = ingredients.iter().map(|i| i.id).collect();
        IngredientRepository::replace_links(conn, recipe_id, &ids).await?;
    }

    Ok(())
}

async fn hydrate<C: ConnectionTrait>(conn: &C, rows: Vec<recipes::Model>) -> Result<Vec<Recipe>> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let mut tags = TagRepository::load_for_recipes(conn, &ids).await?;
    let mut ingredients = IngredientRepository::load_for_recipes(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| Recipe {
            tags: tags.remove(&row.id).unwrap_or_default(),
            ingredients: ingredients.remove(&row.id).unwrap_or_default(),
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            time_minutes: row.time_minutes,
            price: Price::from_cents(row.price_cents),
            description: row.description,
            link: row.link,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}
