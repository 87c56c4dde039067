use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use tidy_core::model::{Card, CardId, DailyProgress, SelectionCriteria, UserStats};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Local store of the card pool.
///
/// The pool has two populations: the snapshot of backend-issued cards,
/// replaced wholesale on each sync, and user-created custom cards, which
/// survive snapshot swaps.
#[async_trait]
pub trait CardPoolRepository: Send + Sync {
    /// Replace the backend snapshot, leaving custom cards untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the swap cannot be applied.
    async fn replace_pool(&self, cards: &[Card]) -> Result<(), StorageError>;

    /// Persist or update a single card (custom-card CRUD).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the card cannot be stored.
    async fn upsert_card(&self, card: &Card) -> Result<(), StorageError>;

    /// Delete a custom card.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing and
    /// `StorageError::Conflict` when the id belongs to a snapshot card.
    async fn delete_card(&self, id: &CardId) -> Result<(), StorageError>;

    /// Fetch the full pool (snapshot plus custom cards).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn all_cards(&self) -> Result<Vec<Card>, StorageError>;
}

/// Persisted user filter settings.
#[async_trait]
pub trait CriteriaRepository: Send + Sync {
    /// Fetch the saved criteria, `None` when never saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_criteria(&self) -> Result<Option<SelectionCriteria>, StorageError>;

    /// Persist the criteria.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn save_criteria(&self, criteria: &SelectionCriteria) -> Result<(), StorageError>;
}

/// Persisted per-day completion state. The skipped set is session-only and
/// deliberately has no home here.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the saved progress, `None` when never saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_progress(&self) -> Result<Option<DailyProgress>, StorageError>;

    /// Persist the progress, overwriting any previous day's state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn save_progress(&self, progress: &DailyProgress) -> Result<(), StorageError>;
}

/// Persisted gamification state.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Fetch the saved stats, `None` when never saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_stats(&self) -> Result<Option<UserStats>, StorageError>;

    /// Persist the stats.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    cards: Arc<Mutex<HashMap<CardId, Card>>>,
    criteria: Arc<Mutex<Option<SelectionCriteria>>>,
    progress: Arc<Mutex<Option<DailyProgress>>>,
    stats: Arc<Mutex<Option<UserStats>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardPoolRepository for InMemoryRepository {
    async fn replace_pool(&self, cards: &[Card]) -> Result<(), StorageError> {
        let mut guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.retain(|_, card| card.is_custom);
        for card in cards {
            guard.insert(card.id.clone(), card.clone());
        }
        Ok(())
    }

    async fn upsert_card(&self, card: &Card) -> Result<(), StorageError> {
        let mut guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(card.id.clone(), card.clone());
        Ok(())
    }

    async fn delete_card(&self, id: &CardId) -> Result<(), StorageError> {
        let mut guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.get(id) {
            None => Err(StorageError::NotFound),
            Some(card) if !card.is_custom => Err(StorageError::Conflict),
            Some(_) => {
                guard.remove(id);
                Ok(())
            }
        }
    }

    async fn all_cards(&self) -> Result<Vec<Card>, StorageError> {
        let guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }
}

#[async_trait]
impl CriteriaRepository for InMemoryRepository {
    async fn get_criteria(&self) -> Result<Option<SelectionCriteria>, StorageError> {
        let guard = self
            .criteria
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_criteria(&self, criteria: &SelectionCriteria) -> Result<(), StorageError> {
        let mut guard = self
            .criteria
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(criteria.clone());
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self) -> Result<Option<DailyProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_progress(&self, progress: &DailyProgress) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(progress.clone());
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for InMemoryRepository {
    async fn get_stats(&self) -> Result<Option<UserStats>, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(stats.clone());
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub pool: Arc<dyn CardPoolRepository>,
    pub criteria: Arc<dyn CriteriaRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub stats: Arc<dyn StatsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let pool: Arc<dyn CardPoolRepository> = Arc::new(repo.clone());
        let criteria: Arc<dyn CriteriaRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let stats: Arc<dyn StatsRepository> = Arc::new(repo);
        Self {
            pool,
            criteria,
            progress,
            stats,
        }
    }
}
