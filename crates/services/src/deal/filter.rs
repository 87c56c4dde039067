use std::collections::BTreeSet;

use tidy_core::model::{Card, CardId, SelectionCriteria};

/// Whether a card passes the user's category/difficulty filter.
///
/// Only the primary category decides eligibility; the optional secondary
/// category is descriptive data and never affects selection.
#[must_use]
pub fn matches_criteria(card: &Card, criteria: &SelectionCriteria) -> bool {
    criteria.includes_category(&card.category) && criteria.includes_difficulty(card.difficulty)
}

/// Narrow the pool to cards the picker may draw from.
///
/// A card is available iff it matches the criteria and is in neither
/// exclusion set. Empty criteria simply match nothing; an empty result is a
/// normal outcome, never an error.
#[must_use]
pub fn filter_available(
    pool: &[Card],
    criteria: &SelectionCriteria,
    completed: &BTreeSet<CardId>,
    skipped: &BTreeSet<CardId>,
) -> Vec<Card> {
    pool.iter()
        .filter(|card| matches_criteria(card, criteria))
        .filter(|card| !completed.contains(&card.id))
        .filter(|card| !skipped.contains(&card.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidy_core::model::{CardDraft, Category, Difficulty, TimeUnit};

    fn card(id: &str, category: &str, difficulty: Difficulty) -> Card {
        CardDraft {
            category: Category::new(category).unwrap(),
            secondary_category: None,
            task: format!("task {id}"),
            comment: String::new(),
            difficulty,
            time_estimate: 10,
            time_unit: TimeUnit::Minutes,
            is_timed: false,
            requires_subscription: false,
        }
        .validate()
        .unwrap()
        .assign_id(CardId::new(id))
    }

    fn criteria(categories: &[&str], difficulties: &[Difficulty]) -> SelectionCriteria {
        SelectionCriteria::from_persisted(
            categories
                .iter()
                .map(|c| Category::new(*c).unwrap())
                .collect(),
            difficulties.iter().copied().collect(),
        )
    }

    fn ids(cards: &[Card]) -> BTreeSet<CardId> {
        cards.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn no_exclusions_returns_exactly_the_matching_subset() {
        let pool = vec![
            card("a", "Kitchen", Difficulty::Easy),
            card("b", "Kitchen", Difficulty::Hard),
            card("c", "Bathroom", Difficulty::Easy),
        ];
        let criteria = criteria(&["Kitchen"], &[Difficulty::Easy]);

        let available = filter_available(&pool, &criteria, &BTreeSet::new(), &BTreeSet::new());
        assert_eq!(ids(&available), ids(&pool[0..1]));
    }

    #[test]
    fn filtering_is_idempotent() {
        let pool = vec![
            card("a", "Kitchen", Difficulty::Easy),
            card("b", "Bathroom", Difficulty::Medium),
        ];
        let criteria = criteria(&["Kitchen", "Bathroom"], &[Difficulty::Easy, Difficulty::Medium]);
        let completed: BTreeSet<CardId> = [CardId::new("a")].into_iter().collect();

        let first = filter_available(&pool, &criteria, &completed, &BTreeSet::new());
        let second = filter_available(&pool, &criteria, &completed, &BTreeSet::new());
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn completed_and_skipped_are_both_excluded() {
        let pool = vec![
            card("a", "Kitchen", Difficulty::Easy),
            card("b", "Kitchen", Difficulty::Easy),
            card("c", "Kitchen", Difficulty::Easy),
        ];
        let criteria = criteria(&["Kitchen"], &[Difficulty::Easy]);
        let completed: BTreeSet<CardId> = [CardId::new("a")].into_iter().collect();
        let skipped: BTreeSet<CardId> = [CardId::new("b")].into_iter().collect();

        let available = filter_available(&pool, &criteria, &completed, &skipped);
        assert_eq!(ids(&available), [CardId::new("c")].into_iter().collect());
    }

    #[test]
    fn clearing_skips_restores_everything_not_completed() {
        let pool = vec![
            card("a", "Kitchen", Difficulty::Easy),
            card("b", "Kitchen", Difficulty::Easy),
        ];
        let criteria = criteria(&["Kitchen"], &[Difficulty::Easy]);
        let completed: BTreeSet<CardId> = [CardId::new("a")].into_iter().collect();
        let skipped: BTreeSet<CardId> = [CardId::new("b")].into_iter().collect();

        assert!(filter_available(&pool, &criteria, &completed, &skipped).is_empty());

        let relaxed = filter_available(&pool, &criteria, &completed, &BTreeSet::new());
        assert_eq!(ids(&relaxed), [CardId::new("b")].into_iter().collect());
    }

    #[test]
    fn empty_criteria_match_nothing() {
        let pool = vec![card("a", "Kitchen", Difficulty::Easy)];
        let empty = criteria(&[], &[]);
        assert!(filter_available(&pool, &empty, &BTreeSet::new(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn secondary_category_does_not_affect_selection() {
        let mut c = card("x", "Bathroom", Difficulty::Easy);
        c.secondary_category = Some(Category::new("Kitchen").unwrap());
        let pool = vec![c];

        // Selecting the secondary category leaves the card ineligible.
        let by_secondary = criteria(&["Kitchen"], &[Difficulty::Easy]);
        assert!(filter_available(&pool, &by_secondary, &BTreeSet::new(), &BTreeSet::new()).is_empty());

        // The primary category is what makes it available.
        let by_primary = criteria(&["Bathroom"], &[Difficulty::Easy]);
        assert_eq!(
            ids(&filter_available(&pool, &by_primary, &BTreeSet::new(), &BTreeSet::new())),
            [CardId::new("x")].into_iter().collect()
        );
    }
}
