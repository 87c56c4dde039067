use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CardId;

/// Day-granularity date key (`YYYY-MM-DD`).
///
/// Rollover detection compares keys for equality, never timestamps, so
/// time-of-day can never trigger a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The day immediately before this one, if representable.
    #[must_use]
    pub fn previous(&self) -> Option<DayKey> {
        self.0.pred_opt().map(DayKey)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(DayKey)
            .map_err(|_| DayKeyError::Invalid(s.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DayKeyError {
    #[error("invalid day key: {0}")]
    Invalid(String),
}

/// Per-day completion bookkeeping.
///
/// The completed set only grows within a day and is cleared exactly when the
/// tracked day changes. Skipped cards are session-only and live with the
/// deal state, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    day: DayKey,
    completed: BTreeSet<CardId>,
}

impl DailyProgress {
    /// Fresh progress for the given day.
    #[must_use]
    pub fn new(day: DayKey) -> Self {
        Self {
            day,
            completed: BTreeSet::new(),
        }
    }

    /// Rebuild progress from a persisted store.
    #[must_use]
    pub fn from_persisted(day: DayKey, completed: BTreeSet<CardId>) -> Self {
        Self { day, completed }
    }

    #[must_use]
    pub fn day(&self) -> DayKey {
        self.day
    }

    #[must_use]
    pub fn completed(&self) -> &BTreeSet<CardId> {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, id: &CardId) -> bool {
        self.completed.contains(id)
    }

    /// Pure day-boundary comparison: true when the tracked day differs from
    /// `today` and the exclusion sets must be cleared by the caller.
    #[must_use]
    pub fn needs_reset(&self, today: DayKey) -> bool {
        self.day != today
    }

    /// Clear completion state and track the new day.
    pub fn roll_over(&mut self, today: DayKey) {
        self.day = today;
        self.completed.clear();
    }

    /// Record a completion. Returns false if the id was already recorded,
    /// which makes double completion harmless.
    pub fn mark_completed(&mut self, id: CardId) -> bool {
        self.completed.insert(id)
    }

    /// Manual reset within the same day (the user's "start over" action).
    pub fn clear(&mut self) {
        self.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn day_key_round_trips() {
        let key = day("2024-01-02");
        assert_eq!(key.to_string(), "2024-01-02");
        assert_eq!(key.to_string().parse::<DayKey>().unwrap(), key);
    }

    #[test]
    fn day_key_rejects_garbage() {
        assert!("yesterday".parse::<DayKey>().is_err());
        assert!("2024-13-40".parse::<DayKey>().is_err());
    }

    #[test]
    fn reset_fires_only_on_day_change() {
        let progress = DailyProgress::new(day("2024-01-01"));
        assert!(progress.needs_reset(day("2024-01-02")));
        assert!(!progress.needs_reset(day("2024-01-01")));
    }

    #[test]
    fn roll_over_clears_completed() {
        let mut progress = DailyProgress::new(day("2024-01-01"));
        progress.mark_completed(CardId::new("a"));
        assert!(progress.is_completed(&CardId::new("a")));

        progress.roll_over(day("2024-01-02"));
        assert_eq!(progress.day(), day("2024-01-02"));
        assert!(progress.completed().is_empty());
    }

    #[test]
    fn double_completion_is_idempotent() {
        let mut progress = DailyProgress::new(day("2024-01-01"));
        assert!(progress.mark_completed(CardId::new("a")));
        assert!(!progress.mark_completed(CardId::new("a")));
        assert_eq!(progress.completed().len(), 1);
    }
}
