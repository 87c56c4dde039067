use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::card::Difficulty;

/// Validated category name (trimmed, non-empty).
///
/// Categories are data owned by the card pool, not a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category(String);

impl Category {
    /// Create a validated category name.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::EmptyCategoryName` if the name is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, CriteriaError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CriteriaError::EmptyCategoryName);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user's active category/difficulty filter.
///
/// `new` enforces the app-level invariant that at least one category and one
/// difficulty remain selected. `from_persisted` skips that check so stale or
/// hand-edited stores load without failing; downstream filtering treats an
/// empty set as matching nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    categories: BTreeSet<Category>,
    difficulties: BTreeSet<Difficulty>,
}

impl SelectionCriteria {
    /// Create criteria, requiring at least one category and one difficulty.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::NoCategories` or `CriteriaError::NoDifficulties`.
    pub fn new(
        categories: BTreeSet<Category>,
        difficulties: BTreeSet<Difficulty>,
    ) -> Result<Self, CriteriaError> {
        if categories.is_empty() {
            return Err(CriteriaError::NoCategories);
        }
        if difficulties.is_empty() {
            return Err(CriteriaError::NoDifficulties);
        }
        Ok(Self {
            categories,
            difficulties,
        })
    }

    /// Rebuild criteria from a persisted store without validation.
    #[must_use]
    pub fn from_persisted(
        categories: BTreeSet<Category>,
        difficulties: BTreeSet<Difficulty>,
    ) -> Self {
        Self {
            categories,
            difficulties,
        }
    }

    #[must_use]
    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    #[must_use]
    pub fn difficulties(&self) -> &BTreeSet<Difficulty> {
        &self.difficulties
    }

    #[must_use]
    pub fn includes_category(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    #[must_use]
    pub fn includes_difficulty(&self, difficulty: Difficulty) -> bool {
        self.difficulties.contains(&difficulty)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CriteriaError {
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    #[error("at least one category must be selected")]
    NoCategories,

    #[error("at least one difficulty must be selected")]
    NoDifficulties,
}
