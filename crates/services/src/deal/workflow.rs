use std::sync::Arc;

use rand::Rng;
use tracing::warn;

use storage::repository::{CardPoolRepository, CriteriaRepository, ProgressRepository};
use tidy_core::model::{Card, DailyProgress, SelectionCriteria};

use crate::Clock;
use crate::error::DealError;
use crate::pool_service::Entitlement;
use crate::stats_service::{CompletionReward, StatsService};
use super::picker::Draw;
use super::service::Deal;

/// Orchestrates the daily deal against persistent storage.
///
/// Owns the clock and repository handles; the mutable per-session state
/// lives in the `Deal` it hands out, so one service can serve consecutive
/// sessions.
#[derive(Clone)]
pub struct DealService {
    clock: Clock,
    pool: Arc<dyn CardPoolRepository>,
    criteria: Arc<dyn CriteriaRepository>,
    progress: Arc<dyn ProgressRepository>,
    stats: StatsService,
}

impl DealService {
    #[must_use]
    pub fn new(
        clock: Clock,
        pool: Arc<dyn CardPoolRepository>,
        criteria: Arc<dyn CriteriaRepository>,
        progress: Arc<dyn ProgressRepository>,
        stats: StatsService,
    ) -> Self {
        Self {
            clock,
            pool,
            criteria,
            progress,
            stats,
        }
    }

    /// Build a `Deal` from storage.
    ///
    /// The pool is gated by the user's entitlement. A pool read failure
    /// degrades to an empty pool (the draw then reports "no card") instead
    /// of propagating; criteria and progress reads are local state and do
    /// propagate.
    ///
    /// # Errors
    ///
    /// Returns `DealError::Storage` when criteria or progress cannot be read.
    pub async fn load(&self, entitlement: Entitlement) -> Result<Deal, DealError> {
        let pool: Vec<Card> = match self.pool.all_cards().await {
            Ok(cards) => cards
                .into_iter()
                .filter(|card| entitlement.can_view(card))
                .collect(),
            Err(err) => {
                warn!(error = %err, "card pool unavailable, dealing from an empty pool");
                Vec::new()
            }
        };

        let criteria = match self.criteria.get_criteria().await? {
            Some(saved) => saved,
            None => default_criteria(&pool),
        };

        let today = self.clock.today();
        let progress = match self.progress.get_progress().await? {
            Some(saved) => saved,
            None => DailyProgress::new(today),
        };

        let mut deal = Deal::new(pool, criteria, progress);
        if deal.check_daily_reset(today) {
            self.progress.save_progress(deal.daily_progress()).await?;
        }
        Ok(deal)
    }

    /// Draw the next card, persisting progress when a day rollover fires.
    ///
    /// # Errors
    ///
    /// Returns `DealError::Storage` when rollover persistence fails.
    pub async fn draw<R: Rng + ?Sized>(
        &self,
        deal: &mut Deal,
        rng: &mut R,
    ) -> Result<Draw, DealError> {
        let today = self.clock.today();
        let rolled = deal.check_daily_reset(today);
        let draw = deal.draw(today, rng);
        if rolled {
            self.progress.save_progress(deal.daily_progress()).await?;
        }
        Ok(draw)
    }

    /// Skip the presented card and draw its replacement.
    ///
    /// # Errors
    ///
    /// Returns `DealError::Storage` when rollover persistence fails.
    pub async fn skip<R: Rng + ?Sized>(
        &self,
        deal: &mut Deal,
        rng: &mut R,
    ) -> Result<Draw, DealError> {
        let today = self.clock.today();
        let rolled = deal.check_daily_reset(today);
        let draw = deal.skip(today, rng);
        if rolled {
            self.progress.save_progress(deal.daily_progress()).await?;
        }
        Ok(draw)
    }

    /// Complete the presented card: persist the day's progress and award
    /// points, streaks, and badges.
    ///
    /// # Errors
    ///
    /// Returns `DealError::NoActiveCard` when nothing is presented, or a
    /// persistence error from progress or stats.
    pub async fn complete(
        &self,
        deal: &mut Deal,
        seconds_spent: u32,
        completed_in_time: bool,
    ) -> Result<CompletionReward, DealError> {
        let card = deal.complete().ok_or(DealError::NoActiveCard)?;
        self.progress.save_progress(deal.daily_progress()).await?;
        let reward = self
            .stats
            .complete_task(&card, seconds_spent, completed_in_time)
            .await?;
        Ok(reward)
    }

    /// Manual same-day reset of completions and skips.
    ///
    /// # Errors
    ///
    /// Returns `DealError::Storage` when persistence fails.
    pub async fn reset_daily(&self, deal: &mut Deal) -> Result<(), DealError> {
        deal.reset_daily();
        self.progress.save_progress(deal.daily_progress()).await?;
        Ok(())
    }
}

/// Every primary category present in the pool plus all difficulties: the
/// filter a fresh install starts with.
#[must_use]
pub(crate) fn default_criteria(pool: &[Card]) -> SelectionCriteria {
    let categories = pool.iter().map(|card| card.category.clone()).collect();
    SelectionCriteria::from_persisted(
        categories,
        tidy_core::model::Difficulty::all().into_iter().collect(),
    )
}
