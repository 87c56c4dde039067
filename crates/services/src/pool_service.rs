use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use storage::repository::CardPoolRepository;
use tidy_core::model::{Card, CardDraft, CardId, Category, Difficulty, TimeUnit};

use crate::error::{CustomCardError, PoolSyncError};

/// Subscription entitlement, decided by the excluded billing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Entitlement {
    #[default]
    Free,
    Premium,
}

impl Entitlement {
    /// Whether a card is unlocked for this entitlement.
    #[must_use]
    pub fn can_view(&self, card: &Card) -> bool {
        card.is_free() || *self == Entitlement::Premium
    }
}

/// One card row as the hosted backend serves it.
#[derive(Debug, Deserialize)]
pub struct RemoteCardRow {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub category2: Option<String>,
    pub task: String,
    #[serde(default)]
    pub comment: String,
    pub difficulty: String,
    pub time_estimate: u32,
    pub time_unit: String,
    #[serde(default)]
    pub is_timed_task: bool,
    #[serde(default)]
    pub is_premium: bool,
}

impl RemoteCardRow {
    /// Validate a backend row into a domain card.
    ///
    /// # Errors
    ///
    /// Returns the first field-level validation failure.
    pub fn into_card(self) -> Result<Card, tidy_core::model::CardValidationError> {
        use tidy_core::model::CardValidationError;

        let draft = CardDraft {
            category: Category::new(self.category)
                .map_err(|_| CardValidationError::EmptyCategory)?,
            secondary_category: match self.category2 {
                Some(raw) if !raw.trim().is_empty() => {
                    Some(Category::new(raw).map_err(|_| CardValidationError::EmptyCategory)?)
                }
                _ => None,
            },
            task: self.task,
            comment: self.comment,
            difficulty: self.difficulty.parse::<Difficulty>()?,
            time_estimate: self.time_estimate,
            time_unit: self.time_unit.parse::<TimeUnit>()?,
            is_timed: self.is_timed_task,
            requires_subscription: self.is_premium,
        };
        Ok(draft.validate()?.assign_id(CardId::new(self.id)))
    }
}

/// Maintains the local card pool: remote snapshot sync plus custom-card CRUD.
#[derive(Clone)]
pub struct PoolService {
    repo: Arc<dyn CardPoolRepository>,
    http: reqwest::Client,
}

impl PoolService {
    #[must_use]
    pub fn new(repo: Arc<dyn CardPoolRepository>) -> Self {
        Self {
            repo,
            http: reqwest::Client::new(),
        }
    }

    /// Pull the hosted snapshot and swap it into the local store.
    ///
    /// Rows that fail validation are dropped with a warning rather than
    /// failing the sync; a fetch failure leaves the existing local snapshot
    /// in place. Returns the number of cards stored.
    ///
    /// # Errors
    ///
    /// Returns `PoolSyncError` on HTTP or storage failures.
    pub async fn sync(&self, endpoint: &str) -> Result<usize, PoolSyncError> {
        let response = self.http.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(PoolSyncError::HttpStatus(response.status()));
        }
        let rows: Vec<RemoteCardRow> = response.json().await?;
        self.replace_from_rows(rows).await
    }

    /// Validate rows and swap them in as the new snapshot. Shared by remote
    /// sync and local seed files.
    ///
    /// # Errors
    ///
    /// Returns `PoolSyncError::Storage` when the swap fails.
    pub async fn replace_from_rows(
        &self,
        rows: Vec<RemoteCardRow>,
    ) -> Result<usize, PoolSyncError> {
        let mut cards = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.into_card() {
                Ok(card) => cards.push(card),
                Err(err) => warn!(card_id = %id, error = %err, "dropping invalid pool row"),
            }
        }

        self.repo.replace_pool(&cards).await?;
        info!(count = cards.len(), "card pool replaced");
        Ok(cards.len())
    }

    /// The full local pool, snapshot and custom cards together.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    pub async fn all_cards(&self) -> Result<Vec<Card>, storage::repository::StorageError> {
        self.repo.all_cards().await
    }

    /// Create a user card with a generated id.
    ///
    /// # Errors
    ///
    /// Returns `CustomCardError` on validation or storage failures.
    pub async fn add_custom(&self, draft: CardDraft) -> Result<Card, CustomCardError> {
        let card = draft.validate()?.assign_generated_id();
        self.repo.upsert_card(&card).await?;
        Ok(card)
    }

    /// Update a user card in place.
    ///
    /// # Errors
    ///
    /// Returns `CustomCardError::NotCustom` for snapshot cards; their
    /// content is owned by the backend.
    pub async fn update_custom(&self, card: &Card) -> Result<(), CustomCardError> {
        if !card.is_custom {
            return Err(CustomCardError::NotCustom);
        }
        self.repo.upsert_card(card).await?;
        Ok(())
    }

    /// Delete a user card.
    ///
    /// # Errors
    ///
    /// Returns `CustomCardError::Storage` with `StorageError::Conflict` for
    /// snapshot cards and `StorageError::NotFound` for unknown ids.
    pub async fn delete_custom(&self, id: &CardId) -> Result<(), CustomCardError> {
        self.repo.delete_card(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn row(id: &str) -> RemoteCardRow {
        RemoteCardRow {
            id: id.to_string(),
            category: "Kitchen".to_string(),
            category2: None,
            task: "empty the fridge shelf".to_string(),
            comment: "one shelf only".to_string(),
            difficulty: "medium".to_string(),
            time_estimate: 20,
            time_unit: "minutes".to_string(),
            is_timed_task: true,
            is_premium: false,
        }
    }

    #[test]
    fn remote_row_maps_to_card() {
        let card = row("r-1").into_card().unwrap();
        assert_eq!(card.id, CardId::new("r-1"));
        assert_eq!(card.category.as_str(), "Kitchen");
        assert_eq!(card.difficulty, Difficulty::Medium);
        assert!(card.is_timed);
        assert!(!card.is_custom);
    }

    #[test]
    fn remote_row_rejects_bad_difficulty() {
        let mut bad = row("r-1");
        bad.difficulty = "brutal".to_string();
        assert!(bad.into_card().is_err());
    }

    #[test]
    fn blank_secondary_category_becomes_none() {
        let mut r = row("r-1");
        r.category2 = Some("  ".to_string());
        assert!(r.into_card().unwrap().secondary_category.is_none());
    }

    #[test]
    fn premium_flag_maps_to_subscription_gate() {
        let mut r = row("r-1");
        r.is_premium = true;
        let card = r.into_card().unwrap();
        assert!(!Entitlement::Free.can_view(&card));
        assert!(Entitlement::Premium.can_view(&card));
    }

    #[tokio::test]
    async fn custom_crud_guards_snapshot_cards() {
        let repo = InMemoryRepository::new();
        let service = PoolService::new(Arc::new(repo.clone()));

        let snapshot = row("r-1").into_card().unwrap();
        repo.upsert_card(&snapshot).await.unwrap();

        let draft = CardDraft {
            category: Category::new("Garage").unwrap(),
            secondary_category: None,
            task: "hang the bicycle".to_string(),
            comment: String::new(),
            difficulty: Difficulty::Hard,
            time_estimate: 1,
            time_unit: TimeUnit::Hours,
            is_timed: false,
            requires_subscription: false,
        };
        let custom = service.add_custom(draft).await.unwrap();
        assert!(custom.is_custom);

        let err = service.update_custom(&snapshot).await.unwrap_err();
        assert!(matches!(err, CustomCardError::NotCustom));

        service.delete_custom(&custom.id).await.unwrap();
        let err = service.delete_custom(&snapshot.id).await.unwrap_err();
        assert!(matches!(err, CustomCardError::Storage(_)));
    }
}
