//! Tags and ingredients: owner-scoped named labels linked to recipes
//! through a join table. Both kinds share the same behaviour, so the
//! repositories are generated from one template.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::entities::{ingredients, recipe_ingredients, recipe_tags, tags};

/// A tag or ingredient as seen by the API: id plus name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub id: i32,
    pub name: String,
}

macro_rules! attribute_repository {
    ($repo:ident, $entity:ident, $link:ident, $link_col:ident, $link_field:ident, $label:literal) => {
        impl From<$entity::Model> for Attribute {
            fn from(model: $entity::Model) -> Self {
                Self {
                    id: model.id,
                    name: model.name,
                }
            }
        }

        pub struct $repo {
            conn: DatabaseConnection,
        }

        impl $repo {
            #[must_use]
            pub const fn new(conn: DatabaseConnection) -> Self {
                Self { conn }
            }

            // ================================================================
            // Owner-scoped CRUD
            // ================================================================

            /// All rows owned by `owner_id`, ordered by name descending.
            /// With `assigned_only`, only rows linked to at least one recipe.
            pub async fn list(&self, owner_id: i32, assigned_only: bool) -> Result<Vec<Attribute>> {
                let mut query = $entity::Entity::find().filter($entity::Column::UserId.eq(owner_id));

                if assigned_only {
                    query = query.filter(
                        $entity::Column::Id.in_subquery(
                            Query::select()
                                .column($link::Column::$link_col)
                                .from($link::Entity)
                                .to_owned(),
                        ),
                    );
                }

                let rows = query
                    .order_by_desc($entity::Column::Name)
                    .order_by_desc($entity::Column::Id)
                    .all(&self.conn)
                    .await
                    .context(concat!("Failed to list ", $label, "s"))?;

                Ok(rows.into_iter().map(Attribute::from).collect())
            }

            pub async fn get(&self, owner_id: i32, id: i32) -> Result<Option<Attribute>> {
                let row = $entity::Entity::find_by_id(id)
                    .filter($entity::Column::UserId.eq(owner_id))
                    .one(&self.conn)
                    .await
                    .context(concat!("Failed to query ", $label))?;

                Ok(row.map(Attribute::from))
            }

            pub async fn find_by_name(&self, owner_id: i32, name: &str) -> Result<Option<Attribute>> {
                let row = $entity::Entity::find()
                    .filter($entity::Column::UserId.eq(owner_id))
                    .filter($entity::Column::Name.eq(name))
                    .one(&self.conn)
                    .await
                    .context(concat!("Failed to query ", $label, " by name"))?;

                Ok(row.map(Attribute::from))
            }

            /// Returns `None` when the row does not exist or is not owned by `owner_id`.
            pub async fn rename(&self, owner_id: i32, id: i32, name: &str) -> Result<Option<Attribute>> {
                let Some(row) = $entity::Entity::find_by_id(id)
                    .filter($entity::Column::UserId.eq(owner_id))
                    .one(&self.conn)
                    .await
                    .context(concat!("Failed to query ", $label, " for rename"))?
                else {
                    return Ok(None);
                };

                let mut active: $entity::ActiveModel = row.into();
                active.name = Set(name.to_string());
                let updated = active
                    .update(&self.conn)
                    .await
                    .context(concat!("Failed to rename ", $label))?;

                Ok(Some(Attribute::from(updated)))
            }

            /// Deletes the row and its recipe links. Returns `false` if nothing
            /// owned by `owner_id` matched.
            pub async fn delete(&self, owner_id: i32, id: i32) -> Result<bool> {
                let txn = self.conn.begin().await?;

                let Some(row) = $entity::Entity::find_by_id(id)
                    .filter($entity::Column::UserId.eq(owner_id))
                    .one(&txn)
                    .await?
                else {
                    return Ok(false);
                };

                $link::Entity::delete_many()
                    .filter($link::Column::$link_col.eq(row.id))
                    .exec(&txn)
                    .await?;

                $entity::Entity::delete_by_id(row.id).exec(&txn).await?;

                txn.commit().await?;
                Ok(true)
            }

            // ================================================================
            // Recipe reconciliation helpers (run inside the caller's transaction)
            // ================================================================

            /// Resolves each name to the owner's row, inserting the missing ones.
            ///
            /// Names are matched exactly and deduplicated; the result follows the
            /// order of first appearance. Concurrent callers cannot create
            /// duplicates because of the unique `(user_id, name)` index.
            pub async fn get_or_create<C: ConnectionTrait>(
                conn: &C,
                owner_id: i32,
                names: &[String],
            ) -> Result<Vec<Attribute>> {
                let mut unique: Vec<&str> = Vec::with_capacity(names.len());
                for name in names {
                    if !unique.contains(&name.as_str()) {
                        unique.push(name.as_str());
                    }
                }

                if unique.is_empty() {
                    return Ok(Vec::new());
                }

                let rows = unique.iter().map(|name| $entity::ActiveModel {
                    name: Set((*name).to_string()),
                    user_id: Set(owner_id),
                    ..Default::default()
                });

                $entity::Entity::insert_many(rows)
                    .on_conflict(
                        OnConflict::columns([$entity::Column::UserId, $entity::Column::Name])
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(conn)
                    .await
                    .context(concat!("Failed to insert ", $label, "s"))?;

                let existing = $entity::Entity::find()
                    .filter($entity::Column::UserId.eq(owner_id))
                    .filter($entity::Column::Name.is_in(unique.iter().copied()))
                    .all(conn)
                    .await
                    .context(concat!("Failed to load ", $label, "s by name"))?;

                let mut by_name: HashMap<String, $entity::Model> = existing
                    .into_iter()
                    .map(|row| (row.name.clone(), row))
                    .collect();

                Ok(unique
                    .into_iter()
                    .filter_map(|name| by_name.remove(name))
                    .map(Attribute::from)
                    .collect())
            }

            /// Makes `ids` the exact link set of `recipe_id`.
            pub async fn replace_links<C: ConnectionTrait>(
                conn: &C,
                recipe_id: i32,
                ids: &[i32],
            ) -> Result<()> {
                $link::Entity::delete_many()
                    .filter($link::Column::RecipeId.eq(recipe_id))
                    .exec(conn)
                    .await
                    .context(concat!("Failed to clear recipe ", $label, " links"))?;

                let mut unique: Vec<i32> = ids.to_vec();
                unique.sort_unstable();
                unique.dedup();

                if unique.is_empty() {
                    return Ok(());
                }

                let links = unique.into_iter().map(|id| $link::ActiveModel {
                    recipe_id: Set(recipe_id),
                    $link_field: Set(id),
                });

                $link::Entity::insert_many(links)
                    .exec_without_returning(conn)
                    .await
                    .context(concat!("Failed to link ", $label, "s to recipe"))?;

                Ok(())
            }

            /// Loads the linked rows of every recipe in `recipe_ids`, ordered by id.
            pub async fn load_for_recipes<C: ConnectionTrait>(
                conn: &C,
                recipe_ids: &[i32],
            ) -> Result<HashMap<i32, Vec<Attribute>>> {
                if recipe_ids.is_empty() {
                    return Ok(HashMap::new());
                }

                let rows = $link::Entity::find()
                    .filter($link::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                    .find_also_related($entity::Entity)
                    .order_by_asc($entity::Column::Id)
                    .all(conn)
                    .await
                    .context(concat!("Failed to load recipe ", $label, "s"))?;

                let mut grouped: HashMap<i32, Vec<Attribute>> = HashMap::new();
                for (link, row) in rows {
                    if let Some(row) = row {
                        grouped.entry(link.recipe_id).or_default().push(Attribute::from(row));
                    }
                }

                Ok(grouped)
            }
        }
    };
}

attribute_repository!(TagRepository, tags, recipe_tags, TagId, tag_id, "tag");
attribute_repository!(
    IngredientRepository,
    ingredients,
    recipe_ingredients,
    IngredientId,
    ingredient_id,
    "ingredient"
);
