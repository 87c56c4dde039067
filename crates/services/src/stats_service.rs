use std::sync::Arc;

use chrono::Duration;

use storage::repository::StatsRepository;
use tidy_core::model::{Badge, Card, CompletedTask, DayKey, UserStats};

use crate::Clock;
use crate::error::StatsError;

/// What a completion earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReward {
    pub points_earned: u32,
    pub new_badges: Vec<Badge>,
    /// Stats after the completion was recorded.
    pub stats: UserStats,
}

/// Gamification orchestration: scoring, streaks, badges, history queries.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    repo: Arc<dyn StatsRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn StatsRepository>) -> Self {
        Self { clock, repo }
    }

    /// Current stats, defaulting to a fresh slate when never saved.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on read failures.
    pub async fn stats(&self) -> Result<UserStats, StatsError> {
        Ok(self.repo.get_stats().await?.unwrap_or_default())
    }

    /// Record a completed task and persist the updated stats.
    ///
    /// Streak bookkeeping uses the UTC date of the completion timestamp on
    /// both sides of the comparison, so a streak can never break from
    /// mixing time bases.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on read or write failures.
    pub async fn complete_task(
        &self,
        card: &Card,
        seconds_spent: u32,
        completed_in_time: bool,
    ) -> Result<CompletionReward, StatsError> {
        let mut stats = self.stats().await?;
        let now = self.clock.now();
        let today = DayKey::new(now.date_naive());

        let (points_earned, new_badges) = stats.record_completion(
            CompletedTask {
                card_id: card.id.clone(),
                completed_at: now,
                seconds_spent,
                was_timed: card.is_timed,
                completed_in_time,
            },
            today,
        );
        self.repo.save_stats(&stats).await?;

        Ok(CompletionReward {
            points_earned,
            new_badges,
            stats,
        })
    }

    /// Number of tasks completed today.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on read failures.
    pub async fn completed_today(&self) -> Result<usize, StatsError> {
        let stats = self.stats().await?;
        let today = DayKey::new(self.clock.now().date_naive());
        Ok(stats.tasks_on(today).len())
    }

    /// Number of tasks completed in the trailing seven days.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on read failures.
    pub async fn completed_this_week(&self) -> Result<usize, StatsError> {
        self.completed_since(Duration::days(7)).await
    }

    /// Number of tasks completed in the trailing thirty days.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on read failures.
    pub async fn completed_this_month(&self) -> Result<usize, StatsError> {
        self.completed_since(Duration::days(30)).await
    }

    async fn completed_since(&self, window: Duration) -> Result<usize, StatsError> {
        let stats = self.stats().await?;
        let now = self.clock.now();
        Ok(stats.tasks_since(now - window, now).len())
    }

    /// Wipe all gamification state.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on write failures.
    pub async fn reset(&self) -> Result<(), StatsError> {
        self.repo.save_stats(&UserStats::new()).await?;
        Ok(())
    }
}
