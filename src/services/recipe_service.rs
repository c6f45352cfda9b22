//! Domain service for recipes: owner-scoped listing, writes with nested
//! tag/ingredient reconciliation, and image attachment.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::db::{NestedNames, NewRecipe, Recipe, RecipeChanges};
use crate::domain::{AttributeKind, FieldErrors, Price, RecipeFilter};

const MAX_TEXT_LENGTH: usize = 255;

/// Errors specific to recipe operations.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// Missing, or owned by someone else.
    #[error("Recipe {0} not found")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<FieldErrors> for RecipeError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// `{"name": "..."}` entry of a nested `tags` / `ingredients` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedAttribute {
    pub name: String,
}

/// Body of a recipe create or update request.
///
/// Every field is optional at the wire level; which ones are required
/// depends on the [`WriteMode`]. `price` is kept raw so a malformed value
/// is reported against the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub time_minutes: Option<i64>,

    #[serde(default)]
    pub price: Option<serde_json::Value>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,

    #[serde(default)]
    pub tags: Option<Vec<NamedAttribute>>,

    #[serde(default)]
    pub ingredients: Option<Vec<NamedAttribute>>,

    /// Owner fields are accepted and ignored.
    #[serde(default)]
    pub user: Option<serde_json::Value>,

    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
}

impl RecipeInput {
    #[must_use]
    pub const fn tries_to_change_owner(&self) -> bool {
        self.user.is_some() || self.user_id.is_some()
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// POST: title, time and price required.
    Create,
    /// PUT: same requirements as create.
    Replace,
    /// PATCH: any subset of fields.
    Partial,
}

impl WriteMode {
    const fn requires_core_fields(self) -> bool {
        matches!(self, Self::Create | Self::Replace)
    }
}

/// Validated form of a [`RecipeInput`].
#[derive(Debug, Clone, Default)]
pub struct PreparedRecipe {
    pub changes: RecipeChanges,
    pub nested: NestedNames,
}

impl PreparedRecipe {
    /// Checks `input` against `mode` and collects every field error.
    pub fn from_input(input: RecipeInput, mode: WriteMode) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let required = mode.requires_core_fields();

        let title = match input.title {
            Some(title) => check_text("title", title.trim(), &mut errors).map(str::to_string),
            None => {
                if required {
                    errors.add("title", "This field is required.");
                }
                None
            }
        };

        let time_minutes = match input.time_minutes {
            Some(minutes) if minutes < 0 => {
                errors.add("time_minutes", "Ensure this value is greater than or equal to 0.");
                None
            }
            Some(minutes) => match i32::try_from(minutes) {
                Ok(minutes) => Some(minutes),
                Err(_) => {
                    errors.add("time_minutes", "Ensure this value is less than or equal to 2147483647.");
                    None
                }
            },
            None => {
                if required {
                    errors.add("time_minutes", "This field is required.");
                }
                None
            }
        };

        let price = match input.price {
            Some(raw) => match parse_price(&raw) {
                Ok(price) => Some(price),
                Err(message) => {
                    errors.add("price", message);
                    None
                }
            },
            None => {
                if required {
                    errors.add("price", "This field is required.");
                }
                None
            }
        };

        let description = input.description.map(|d| d.map(|d| d.trim().to_string()));

        let link = input.link.map(|link| {
            link.map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .filter(|l| check_text("link", l, &mut errors).is_some())
        });

        let tags = input
            .tags
            .map(|list| check_names(AttributeKind::Tag, list, &mut errors));
        let ingredients = input
            .ingredients
            .map(|list| check_names(AttributeKind::Ingredient, list, &mut errors));

        errors.into_result()?;

        Ok(Self {
            changes: RecipeChanges {
                title,
                time_minutes,
                price,
                description,
                link,
            },
            nested: NestedNames { tags, ingredients },
        })
    }

    /// The insert form; only valid after [`WriteMode::Create`] validation.
    pub fn into_new(self) -> Result<(NewRecipe, NestedNames), FieldErrors> {
        let RecipeChanges {
            title,
            time_minutes,
            price,
            description,
            link,
        } = self.changes;

        match (title, time_minutes, price) {
            (Some(title), Some(time_minutes), Some(price)) => Ok((
                NewRecipe {
                    title,
                    time_minutes,
                    price,
                    description: description.flatten(),
                    link: link.flatten(),
                },
                self.nested,
            )),
            _ => Err(FieldErrors::single("non_field_errors", "Missing required fields.")),
        }
    }
}

fn check_text<'a>(field: &str, value: &'a str, errors: &mut FieldErrors) -> Option<&'a str> {
    if value.is_empty() {
        errors.add(field, "This field may not be blank.");
        None
    } else if value.chars().count() > MAX_TEXT_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_TEXT_LENGTH} characters."),
        );
        None
    } else {
        Some(value)
    }
}

fn check_names(
    kind: AttributeKind,
    list: Vec<NamedAttribute>,
    errors: &mut FieldErrors,
) -> Vec<String> {
    let field = kind.payload_field();
    list.into_iter()
        .filter_map(|entry| {
            let name = entry.name.trim();
            check_text(field, name, errors).map(str::to_string)
        })
        .collect()
}

fn parse_price(raw: &serde_json::Value) -> Result<Price, String> {
    match raw {
        serde_json::Value::String(s) => Price::parse(s).map_err(|e| e.to_string()),
        serde_json::Value::Number(n) => Price::parse(&n.to_string()).map_err(|e| e.to_string()),
        _ => Err("A valid number is required.".to_string()),
    }
}

/// Domain service trait for recipe operations. Every call is scoped to
/// `owner_id`; other owners' recipes behave as if they did not exist.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Lists the owner's recipes, newest first, narrowed by `filter`.
    async fn list(&self, owner_id: i32, filter: &RecipeFilter) -> Result<Vec<Recipe>, RecipeError>;

    /// Retrieves one recipe.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::NotFound`] if it does not exist or belongs to another owner.
    async fn get(&self, owner_id: i32, id: i32) -> Result<Recipe, RecipeError>;

    /// Creates a recipe, reconciling nested tags and ingredients.
    async fn create(&self, owner_id: i32, input: RecipeInput) -> Result<Recipe, RecipeError>;

    /// Updates a recipe under PUT or PATCH rules.
    async fn update(
        &self,
        owner_id: i32,
        id: i32,
        input: RecipeInput,
        mode: WriteMode,
    ) -> Result<Recipe, RecipeError>;

    /// Deletes a recipe, its links and its stored image.
    async fn delete(&self, owner_id: i32, id: i32) -> Result<(), RecipeError>;

    /// Validates and stores an image, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] when `bytes` is not a supported
    /// image; the recipe is left unchanged.
    async fn upload_image(
        &self,
        owner_id: i32,
        id: i32,
        bytes: &[u8],
    ) -> Result<Recipe, RecipeError>;
}
