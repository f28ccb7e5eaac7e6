//! Product category.
//!
//! Categories are free text in the store, but must not be blank. The
//! back-office form offers [`Category::SUGGESTED`] as presets.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Category`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category cannot be empty")]
    Empty,
    #[error("category must be at most {max} characters")]
    TooLong { max: usize },
}

/// A trimmed, non-empty product category name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Maximum length of a category name.
    pub const MAX_LENGTH: usize = 64;

    /// Preset categories offered by the product form.
    pub const SUGGESTED: [&'static str; 6] = [
        "Snacks",
        "Beverages",
        "Sweets",
        "Traditional",
        "Chips",
        "Dried Fruits",
    ];

    /// Parse a category name.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::Empty`] for blank input and
    /// [`CategoryError::TooLong`] past [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, CategoryError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CategoryError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(CategoryError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = CategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
