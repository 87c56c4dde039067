use std::collections::BTreeSet;

use rand::Rng;

use tidy_core::model::{Card, CardId, DailyProgress, DayKey, SelectionCriteria};

use super::filter::matches_criteria;
use super::picker::{Draw, draw_card};
use super::progress::DealProgress;

/// In-memory state of today's card deal.
///
/// Holds the pool snapshot, the active criteria, the day's completion
/// bookkeeping, the session-only skipped set, and at most one presented
/// card. All mutation goes through `draw`/`skip`/`complete`, keeping the
/// picker's state machine (idle → selecting → presenting) in one place.
pub struct Deal {
    pool: Vec<Card>,
    criteria: SelectionCriteria,
    progress: DailyProgress,
    skipped: BTreeSet<CardId>,
    current: Option<Card>,
}

impl Deal {
    /// Create a deal over an already-entitled pool snapshot.
    #[must_use]
    pub fn new(pool: Vec<Card>, criteria: SelectionCriteria, progress: DailyProgress) -> Self {
        Self {
            pool,
            criteria,
            progress,
            skipped: BTreeSet::new(),
            current: None,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &[Card] {
        &self.pool
    }

    #[must_use]
    pub fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    #[must_use]
    pub fn daily_progress(&self) -> &DailyProgress {
        &self.progress
    }

    #[must_use]
    pub fn skipped(&self) -> &BTreeSet<CardId> {
        &self.skipped
    }

    /// The card currently presented, if any.
    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        self.current.as_ref()
    }

    /// Replace the active criteria (a settings change mid-session).
    pub fn set_criteria(&mut self, criteria: SelectionCriteria) {
        self.criteria = criteria;
    }

    /// Detect and apply day rollover. Returns true when a rollover happened
    /// and the progress should be re-persisted by the caller.
    pub fn check_daily_reset(&mut self, today: DayKey) -> bool {
        if !self.progress.needs_reset(today) {
            return false;
        }
        self.progress.roll_over(today);
        self.skipped.clear();
        self.current = None;
        true
    }

    /// Run one selection step and present the result.
    ///
    /// The previous card, if any, is replaced; there is never more than one
    /// active card.
    pub fn draw<R: Rng + ?Sized>(&mut self, today: DayKey, rng: &mut R) -> Draw {
        self.check_daily_reset(today);
        let draw = draw_card(
            &self.pool,
            &self.criteria,
            &self.progress,
            &mut self.skipped,
            rng,
        );
        self.current = draw.card().cloned();
        draw
    }

    /// Skip the presented card and immediately draw the next one.
    ///
    /// The skipped card stays excluded until the pool is exhausted or the
    /// day rolls over. Skipping with no card presented is just a draw.
    pub fn skip<R: Rng + ?Sized>(&mut self, today: DayKey, rng: &mut R) -> Draw {
        if let Some(card) = self.current.take() {
            self.skipped.insert(card.id);
        }
        self.draw(today, rng)
    }

    /// Record the presented card as completed for the day and clear it.
    ///
    /// Does not auto-advance; the caller draws again explicitly. Returns the
    /// completed card, or `None` when nothing was presented.
    pub fn complete(&mut self) -> Option<Card> {
        let card = self.current.take()?;
        self.progress.mark_completed(card.id.clone());
        Some(card)
    }

    /// The user's manual "start over" action: clears completions and skips
    /// for the current day without touching the tracked date.
    pub fn reset_daily(&mut self) {
        self.progress.clear();
        self.skipped.clear();
        self.current = None;
    }

    /// Today's counts for the current criteria.
    #[must_use]
    pub fn progress(&self) -> DealProgress {
        let matching = self
            .pool
            .iter()
            .filter(|card| matches_criteria(card, &self.criteria))
            .count();
        let completed_today = self
            .pool
            .iter()
            .filter(|card| matches_criteria(card, &self.criteria))
            .filter(|card| self.progress.is_completed(&card.id))
            .count();
        let remaining = matching - completed_today;
        DealProgress {
            matching,
            completed_today,
            remaining,
            all_done: matching > 0 && remaining == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tidy_core::model::{CardDraft, Category, Difficulty, TimeUnit};

    use crate::deal::picker::NoCardReason;

    fn card(id: &str, category: &str) -> Card {
        CardDraft {
            category: Category::new(category).unwrap(),
            secondary_category: None,
            task: format!("task {id}"),
            comment: String::new(),
            difficulty: Difficulty::Easy,
            time_estimate: 10,
            time_unit: TimeUnit::Minutes,
            is_timed: false,
            requires_subscription: false,
        }
        .validate()
        .unwrap()
        .assign_id(CardId::new(id))
    }

    fn criteria(categories: &[&str]) -> SelectionCriteria {
        SelectionCriteria::from_persisted(
            categories
                .iter()
                .map(|c| Category::new(*c).unwrap())
                .collect(),
            Difficulty::all().into_iter().collect(),
        )
    }

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn deal(pool: Vec<Card>, categories: &[&str]) -> Deal {
        Deal::new(pool, criteria(categories), DailyProgress::new(day("2024-01-01")))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn draw_presents_exactly_one_card() {
        let mut deal = deal(vec![card("a", "Kitchen"), card("b", "Kitchen")], &["Kitchen"]);
        let mut rng = rng();

        assert!(deal.current_card().is_none());
        let draw = deal.draw(day("2024-01-01"), &mut rng);
        assert!(draw.card().is_some());
        assert_eq!(deal.current_card(), draw.card());
    }

    #[test]
    fn completing_excludes_for_the_rest_of_the_day() {
        let mut deal = deal(vec![card("a", "Kitchen")], &["Kitchen"]);
        let mut rng = rng();

        deal.draw(day("2024-01-01"), &mut rng);
        let completed = deal.complete().unwrap();
        assert_eq!(completed.id, CardId::new("a"));
        assert!(deal.current_card().is_none());

        let draw = deal.draw(day("2024-01-01"), &mut rng);
        assert_eq!(draw, Draw::NoCard(NoCardReason::AllDone));
    }

    #[test]
    fn completing_without_a_card_is_a_no_op() {
        let mut deal = deal(vec![card("a", "Kitchen")], &["Kitchen"]);
        assert!(deal.complete().is_none());
    }

    #[test]
    fn skip_excludes_until_exhaustion_then_redeals() {
        let mut deal = deal(vec![card("a", "Kitchen")], &["Kitchen"]);
        let mut rng = rng();

        deal.draw(day("2024-01-01"), &mut rng);
        // Only card in the pool: the skip exhausts availability, the skipped
        // set is cleared, and the same card comes back.
        let draw = deal.skip(day("2024-01-01"), &mut rng);
        assert_eq!(draw.card().map(|c| c.id.clone()), Some(CardId::new("a")));
        assert!(deal.skipped().is_empty());
    }

    #[test]
    fn skip_holds_back_while_alternatives_exist() {
        let mut deal = deal(vec![card("a", "Kitchen"), card("b", "Kitchen")], &["Kitchen"]);
        let mut rng = rng();

        let first = deal.draw(day("2024-01-01"), &mut rng);
        let first_id = first.card().unwrap().id.clone();
        let second = deal.skip(day("2024-01-01"), &mut rng);
        assert_ne!(second.card().unwrap().id, first_id);
    }

    #[test]
    fn day_rollover_clears_both_exclusion_sets() {
        let mut deal = deal(vec![card("a", "Kitchen"), card("b", "Kitchen")], &["Kitchen"]);
        let mut rng = rng();

        deal.draw(day("2024-01-01"), &mut rng);
        deal.complete();
        deal.draw(day("2024-01-01"), &mut rng);
        deal.skip(day("2024-01-01"), &mut rng);

        assert!(deal.check_daily_reset(day("2024-01-02")));
        assert!(deal.daily_progress().completed().is_empty());
        assert!(deal.skipped().is_empty());
        assert_eq!(deal.daily_progress().day(), day("2024-01-02"));

        // Same-day check does nothing.
        assert!(!deal.check_daily_reset(day("2024-01-02")));
    }

    #[test]
    fn criteria_change_reclassifies_the_empty_outcome() {
        let mut deal = deal(vec![card("a", "Kitchen")], &["Kitchen"]);
        let mut rng = rng();

        deal.draw(day("2024-01-01"), &mut rng);
        deal.complete();
        assert_eq!(
            deal.draw(day("2024-01-01"), &mut rng),
            Draw::NoCard(NoCardReason::AllDone)
        );

        deal.set_criteria(criteria(&["Garage"]));
        assert_eq!(
            deal.draw(day("2024-01-01"), &mut rng),
            Draw::NoCard(NoCardReason::NoMatch)
        );
    }

    #[test]
    fn progress_counts_follow_completions() {
        let mut deal = deal(
            vec![card("a", "Kitchen"), card("b", "Kitchen"), card("c", "Garage")],
            &["Kitchen"],
        );
        let mut rng = rng();

        let before = deal.progress();
        assert_eq!(before.matching, 2);
        assert_eq!(before.remaining, 2);
        assert!(!before.all_done);

        deal.draw(day("2024-01-01"), &mut rng);
        deal.complete();
        deal.draw(day("2024-01-01"), &mut rng);
        deal.complete();

        let after = deal.progress();
        assert_eq!(after.completed_today, 2);
        assert_eq!(after.remaining, 0);
        assert!(after.all_done);
    }

    #[test]
    fn reset_daily_restores_availability_same_day() {
        let mut deal = deal(vec![card("a", "Kitchen")], &["Kitchen"]);
        let mut rng = rng();

        deal.draw(day("2024-01-01"), &mut rng);
        deal.complete();
        deal.reset_daily();

        assert_eq!(deal.daily_progress().day(), day("2024-01-01"));
        let draw = deal.draw(day("2024-01-01"), &mut rng);
        assert!(draw.card().is_some());
    }
}
