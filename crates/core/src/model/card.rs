use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::criteria::Category;
use crate::model::ids::CardId;

//
// ─── CARD ATTRIBUTES ───────────────────────────────────────────────────────────
//

/// Difficulty bucket for a task card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// All difficulty buckets, for building default criteria.
    #[must_use]
    pub fn all() -> [Difficulty; 3] {
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(CardValidationError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Unit for a card's time estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    Hours,
}

impl TimeUnit {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = CardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" => Ok(TimeUnit::Minutes),
            "hours" => Ok(TimeUnit::Hours),
            other => Err(CardValidationError::UnknownTimeUnit(other.to_string())),
        }
    }
}

//
// ─── CARD TYPES ────────────────────────────────────────────────────────────────
//

/// Unvalidated card data as it enters the module boundary (remote rows,
/// seed files, user input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub category: Category,
    pub secondary_category: Option<Category>,
    pub task: String,
    pub comment: String,
    pub difficulty: Difficulty,
    pub time_estimate: u32,
    pub time_unit: TimeUnit,
    pub is_timed: bool,
    pub requires_subscription: bool,
}

impl CardDraft {
    /// Validates the draft: task text must be non-empty and the time
    /// estimate positive.
    ///
    /// # Errors
    ///
    /// Returns `CardValidationError` describing the first failing field.
    pub fn validate(self) -> Result<ValidatedCard, CardValidationError> {
        let task = self.task.trim().to_string();
        if task.is_empty() {
            return Err(CardValidationError::EmptyTask);
        }
        if self.time_estimate == 0 {
            return Err(CardValidationError::ZeroTimeEstimate);
        }

        Ok(ValidatedCard {
            category: self.category,
            secondary_category: self.secondary_category,
            task,
            comment: self.comment.trim().to_string(),
            difficulty: self.difficulty,
            time_estimate: self.time_estimate,
            time_unit: self.time_unit,
            is_timed: self.is_timed,
            requires_subscription: self.requires_subscription,
        })
    }
}

/// Card data that passed validation but has no identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCard {
    category: Category,
    secondary_category: Option<Category>,
    task: String,
    comment: String,
    difficulty: Difficulty,
    time_estimate: u32,
    time_unit: TimeUnit,
    is_timed: bool,
    requires_subscription: bool,
}

impl ValidatedCard {
    /// Attach a backend-issued identifier.
    #[must_use]
    pub fn assign_id(self, id: CardId) -> Card {
        self.into_card(id, false)
    }

    /// Generate a local identifier and mark the card as user-created.
    #[must_use]
    pub fn assign_generated_id(self) -> Card {
        self.into_card(CardId::generate(), true)
    }

    fn into_card(self, id: CardId, is_custom: bool) -> Card {
        Card {
            id,
            category: self.category,
            secondary_category: self.secondary_category,
            task: self.task,
            comment: self.comment,
            difficulty: self.difficulty,
            time_estimate: self.time_estimate,
            time_unit: self.time_unit,
            is_timed: self.is_timed,
            requires_subscription: self.requires_subscription,
            is_custom,
        }
    }
}

/// A single task card. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub category: Category,
    pub secondary_category: Option<Category>,
    pub task: String,
    pub comment: String,
    pub difficulty: Difficulty,
    pub time_estimate: u32,
    pub time_unit: TimeUnit,
    pub is_timed: bool,
    pub requires_subscription: bool,
    pub is_custom: bool,
}

impl Card {
    /// The card's time estimate as a duration.
    #[must_use]
    pub fn estimated_duration(&self) -> Duration {
        let secs = match self.time_unit {
            TimeUnit::Minutes => u64::from(self.time_estimate) * 60,
            TimeUnit::Hours => u64::from(self.time_estimate) * 3600,
        };
        Duration::from_secs(secs)
    }

    /// Whether the card is visible without a paid subscription.
    #[must_use]
    pub fn is_free(&self) -> bool {
        !self.requires_subscription
    }
}

//
// ─── CARD VALIDATION ERRORS ────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardValidationError {
    #[error("task text cannot be empty")]
    EmptyTask,

    #[error("category name cannot be empty")]
    EmptyCategory,

    #[error("time estimate must be greater than zero")]
    ZeroTimeEstimate,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("unknown time unit: {0}")]
    UnknownTimeUnit(String),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(task: &str) -> CardDraft {
        CardDraft {
            category: Category::new("Kitchen").unwrap(),
            secondary_category: None,
            task: task.to_string(),
            comment: "a comment".to_string(),
            difficulty: Difficulty::Easy,
            time_estimate: 15,
            time_unit: TimeUnit::Minutes,
            is_timed: true,
            requires_subscription: false,
        }
    }

    #[test]
    fn draft_fails_if_task_empty() {
        let err = draft("   ").validate().unwrap_err();
        assert_eq!(err, CardValidationError::EmptyTask);
    }

    #[test]
    fn draft_fails_if_estimate_zero() {
        let mut d = draft("clear the counter");
        d.time_estimate = 0;
        let err = d.validate().unwrap_err();
        assert_eq!(err, CardValidationError::ZeroTimeEstimate);
    }

    #[test]
    fn valid_draft_assigns_backend_id() {
        let card = draft("clear the counter")
            .validate()
            .unwrap()
            .assign_id(CardId::new("c-1"));
        assert_eq!(card.id, CardId::new("c-1"));
        assert!(!card.is_custom);
        assert_eq!(card.task, "clear the counter");
    }

    #[test]
    fn generated_id_marks_card_custom() {
        let card = draft("sort the mail").validate().unwrap().assign_generated_id();
        assert!(card.is_custom);
    }

    #[test]
    fn estimated_duration_converts_units() {
        let mut d = draft("wipe shelves");
        d.time_estimate = 2;
        d.time_unit = TimeUnit::Hours;
        let card = d.validate().unwrap().assign_generated_id();
        assert_eq!(card.estimated_duration(), Duration::from_secs(7200));
    }

    #[test]
    fn secondary_category_is_preserved() {
        let mut d = draft("dust the lamp");
        d.secondary_category = Some(Category::new("Living Room").unwrap());
        let card = d.validate().unwrap().assign_generated_id();
        assert_eq!(
            card.secondary_category,
            Some(Category::new("Living Room").unwrap())
        );
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn time_unit_parses() {
        assert_eq!("minutes".parse::<TimeUnit>().unwrap(), TimeUnit::Minutes);
        assert_eq!("hours".parse::<TimeUnit>().unwrap(), TimeUnit::Hours);
        assert!("days".parse::<TimeUnit>().is_err());
    }
}
