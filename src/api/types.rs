use serde::Serialize;

use crate::db::{Attribute, Recipe};
use crate::domain::{FieldErrors, Price};
use crate::services::UserInfo;
use crate::services::image::public_url;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttributeDto {
    pub id: i32,
    pub name: String,
}

impl From<Attribute> for AttributeDto {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name,
        }
    }
}

/// Recipe as returned by list, create and update.
#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: Option<String>,
    pub tags: Vec<AttributeDto>,
    pub ingredients: Vec<AttributeDto>,
}

impl From<Recipe> for RecipeDto {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags.into_iter().map(AttributeDto::from).collect(),
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(AttributeDto::from)
                .collect(),
        }
    }
}

/// Recipe as returned by retrieve: the summary plus description and image.
#[derive(Debug, Serialize)]
pub struct RecipeDetailDto {
    #[serde(flatten)]
    pub summary: RecipeDto,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl From<Recipe> for RecipeDetailDto {
    fn from(mut recipe: Recipe) -> Self {
        let description = recipe.description.take();
        let image = recipe.image.take().map(|path| public_url(&path));
        Self {
            summary: RecipeDto::from(recipe),
            description,
            image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageDto {
    pub id: i32,
    pub image: Option<String>,
}

impl From<Recipe> for RecipeImageDto {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            image: recipe.image.as_deref().map(public_url),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub email: String,
    pub name: String,
}

impl From<UserInfo> for UserDto {
    fn from(user: UserInfo) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}
