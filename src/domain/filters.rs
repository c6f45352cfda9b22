//! Query-parameter parsing for the recipe and attribute list endpoints.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid value '{value}' for '{param}': expected a comma-separated list of integer ids")]
    InvalidIdList { param: &'static str, value: String },

    #[error("Invalid value '{value}' for '{param}': expected an integer flag (0 or 1)")]
    InvalidFlag { param: &'static str, value: String },
}

impl FilterError {
    #[must_use]
    pub const fn param(&self) -> &'static str {
        match self {
            Self::InvalidIdList { param, .. } | Self::InvalidFlag { param, .. } => param,
        }
    }
}

/// Parses `"1,2,3"` into ids. Whitespace around each id is ignored; an empty
/// segment or a non-integer fails the whole list.
pub fn parse_id_list(param: &'static str, raw: &str) -> Result<Vec<i32>, FilterError> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| FilterError::InvalidIdList {
                    param,
                    value: raw.to_string(),
                })
        })
        .collect()
}

/// Recipe list filter.
///
/// `None` on an axis means "unfiltered"; `Some(ids)` keeps recipes linked to
/// at least one of `ids`. Both axes combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

impl RecipeFilter {
    pub fn from_params(
        tags: Option<&str>,
        ingredients: Option<&str>,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            tag_ids: parse_optional_ids("tags", tags)?,
            ingredient_ids: parse_optional_ids("ingredients", ingredients)?,
        })
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tag_ids.is_none() && self.ingredient_ids.is_none()
    }
}

fn parse_optional_ids(
    param: &'static str,
    raw: Option<&str>,
) -> Result<Option<Vec<i32>>, FilterError> {
    match raw {
        Some(raw) if !raw.is_empty() => parse_id_list(param, raw).map(Some),
        _ => Ok(None),
    }
}

/// Tag / ingredient list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    /// Only rows linked to at least one recipe, each row once.
    pub assigned_only: bool,
}

impl AttributeFilter {
    /// Any integer is accepted, non-zero meaning true. Missing or empty means
    /// false.
    pub fn from_params(assigned_only: Option<&str>) -> Result<Self, FilterError> {
        let assigned_only = match assigned_only.map(str::trim) {
            None | Some("") => false,
            Some(raw) => {
                raw.parse::<i64>()
                    .map_err(|_| FilterError::InvalidFlag {
                        param: "assigned_only",
                        value: raw.to_string(),
                    })?
                    != 0
            }
        };

        Ok(Self { assigned_only })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_lists() {
        assert_eq!(parse_id_list("tags", "1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list("tags", " 4 , 5").unwrap(), vec![4, 5]);
        assert_eq!(parse_id_list("tags", "7").unwrap(), vec![7]);
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = parse_id_list("tags", "1,abc").unwrap_err();
        assert_eq!(err.param(), "tags");
        assert!(parse_id_list("tags", "1,,2").is_err());
        assert!(parse_id_list("tags", "1.5").is_err());
    }

    #[test]
    fn empty_filter_string_means_no_filter() {
        let filter = RecipeFilter::from_params(Some(""), None).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn recipe_filter_reports_the_failing_param() {
        let err = RecipeFilter::from_params(Some("1"), Some("x")).unwrap_err();
        assert_eq!(err.param(), "ingredients");
    }

    #[test]
    fn recipe_filter_keeps_both_axes() {
        let filter = RecipeFilter::from_params(Some("1,2"), Some("3")).unwrap();
        assert_eq!(filter.tag_ids, Some(vec![1, 2]));
        assert_eq!(filter.ingredient_ids, Some(vec![3]));
    }

    #[test]
    fn assigned_only_flag() {
        assert!(!AttributeFilter::from_params(None).unwrap().assigned_only);
        assert!(!AttributeFilter::from_params(Some("0")).unwrap().assigned_only);
        assert!(AttributeFilter::from_params(Some("1")).unwrap().assigned_only);
        assert!(AttributeFilter::from_params(Some("2")).unwrap().assigned_only);
        assert!(AttributeFilter::from_params(Some("yes")).is_err());
    }
}
