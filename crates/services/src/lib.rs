#![forbid(unsafe_code)]

pub mod criteria_service;
pub mod deal;
pub mod error;
pub mod pool_service;
pub mod stats_service;

pub use tidy_core::Clock;

pub use criteria_service::CriteriaService;
pub use deal::{Deal, DealProgress, DealService, Draw, NoCardReason, filter_available};
pub use error::{CriteriaServiceError, CustomCardError, DealError, PoolSyncError, StatsError};
pub use pool_service::{Entitlement, PoolService};
pub use stats_service::{CompletionReward, StatsService};
