//! Domain types for recipes, their attributes and accounts.
//!
//! Pure logic with no database access: price arithmetic, email
//! normalization, field validation messages and list-filter parsing.

pub mod email;
pub mod field_errors;
pub mod filters;
pub mod price;

pub use email::normalize_email;
pub use field_errors::FieldErrors;
pub use filters::{AttributeFilter, FilterError, RecipeFilter};
pub use price::{Price, PriceError};

use serde::Serialize;
use std::fmt;

/// The two kinds of per-user labels a recipe can be linked to.
///
/// Tags and ingredients share one shape (id, name, owner) and one set of
/// list/rename/delete semantics; this enum selects the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }

    /// Name of the nested list field in recipe payloads.
    #[must_use]
    pub const fn payload_field(&self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Ingredient => "ingredients",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Tag => "Tag",
            Self::Ingredient => "Ingredient",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_kind_labels() {
        assert_eq!(AttributeKind::Tag.as_str(), "tag");
        assert_eq!(AttributeKind::Ingredient.payload_field(), "ingredients");
        assert_eq!(AttributeKind::Ingredient.to_string(), "Ingredient");
    }

    #[test]
    fn attribute_kind_serialization() {
        let json = serde_json::to_string(&AttributeKind::Tag).unwrap();
        assert_eq!(json, "\"tag\"");
    }
}
