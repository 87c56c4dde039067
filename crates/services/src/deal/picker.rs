use std::collections::BTreeSet;

use rand::Rng;

use tidy_core::model::{Card, CardId, DailyProgress, SelectionCriteria};

use super::filter::{filter_available, matches_criteria};

/// Why no card could be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoCardReason {
    /// Cards match the filters, but every one of them is completed today.
    AllDone,
    /// The criteria match nothing in the pool at all.
    NoMatch,
}

/// Outcome of a draw. `NoCard` is a normal terminal state, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draw {
    Card(Card),
    NoCard(NoCardReason),
}

impl Draw {
    #[must_use]
    pub fn card(&self) -> Option<&Card> {
        match self {
            Draw::Card(card) => Some(card),
            Draw::NoCard(_) => None,
        }
    }
}

/// Uniform random pick over the available cards.
///
/// Deliberately unweighted: no bias by difficulty or recency. The RNG is
/// injected so tests can pass a seeded source.
#[must_use]
pub fn pick_card<R: Rng + ?Sized>(available: &[Card], rng: &mut R) -> Option<Card> {
    if available.is_empty() {
        return None;
    }
    let index = rng.random_range(0..available.len());
    Some(available[index].clone())
}

/// One selection step.
///
/// Filters the pool, picks uniformly, and on exhaustion clears the skipped
/// set (never the completed set) and retries once. The final empty outcome
/// is classified by whether the criteria match anything in the pool when
/// completion and skips are ignored.
pub fn draw_card<R: Rng + ?Sized>(
    pool: &[Card],
    criteria: &SelectionCriteria,
    progress: &DailyProgress,
    skipped: &mut BTreeSet<CardId>,
    rng: &mut R,
) -> Draw {
    let available = filter_available(pool, criteria, progress.completed(), skipped);
    if let Some(card) = pick_card(&available, rng) {
        return Draw::Card(card);
    }

    // Pool exhausted: skipped cards become eligible again.
    skipped.clear();
    let relaxed = filter_available(pool, criteria, progress.completed(), skipped);
    if let Some(card) = pick_card(&relaxed, rng) {
        return Draw::Card(card);
    }

    if pool.iter().any(|card| matches_criteria(card, criteria)) {
        Draw::NoCard(NoCardReason::AllDone)
    } else {
        Draw::NoCard(NoCardReason::NoMatch)
    }
}
