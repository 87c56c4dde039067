//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use tidy_core::model::{CardValidationError, CriteriaError};

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the deal workflow.
///
/// Drawing itself never fails: an empty pool or collaborator outage
/// degrades to `Draw::NoCard`. Only persistence can error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DealError {
    #[error("no card is currently presented")]
    NoActiveCard,

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CriteriaService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CriteriaServiceError {
    #[error(transparent)]
    Invalid(#[from] CriteriaError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while syncing the remote card pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolSyncError {
    #[error("pool endpoint returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by custom-card CRUD.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CustomCardError {
    #[error("card is not user-created")]
    NotCustom,

    #[error(transparent)]
    Card(#[from] CardValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
