use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;
use tidy_core::model::{Card, CardId, Category, Difficulty, TimeUnit};

pub(crate) fn ser_err(err: impl std::fmt::Display) -> StorageError {
    StorageError::Serialization(err.to_string())
}

pub(crate) fn conn_err(err: impl std::fmt::Display) -> StorageError {
    StorageError::Connection(err.to_string())
}

pub(crate) fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(ser_err)
}

/// Map a `cards` row back into a domain `Card`.
///
/// Persisted rows already passed draft validation on the way in, so this
/// only guards against hand-edited databases.
pub(crate) fn card_from_row(row: &SqliteRow) -> Result<Card, StorageError> {
    let id: String = row.try_get("id").map_err(ser_err)?;
    let category: String = row.try_get("category").map_err(ser_err)?;
    let secondary: Option<String> = row.try_get("secondary_category").map_err(ser_err)?;
    let task: String = row.try_get("task").map_err(ser_err)?;
    let comment: String = row.try_get("comment").map_err(ser_err)?;
    let difficulty: String = row.try_get("difficulty").map_err(ser_err)?;
    let time_estimate: i64 = row.try_get("time_estimate").map_err(ser_err)?;
    let time_unit: String = row.try_get("time_unit").map_err(ser_err)?;
    let is_timed: bool = row.try_get("is_timed").map_err(ser_err)?;
    let requires_subscription: bool = row.try_get("requires_subscription").map_err(ser_err)?;
    let is_custom: bool = row.try_get("is_custom").map_err(ser_err)?;

    let secondary_category = secondary
        .map(Category::new)
        .transpose()
        .map_err(ser_err)?;

    Ok(Card {
        id: CardId::new(id),
        category: Category::new(category).map_err(ser_err)?,
        secondary_category,
        task,
        comment,
        difficulty: difficulty.parse::<Difficulty>().map_err(ser_err)?,
        time_estimate: u32::try_from(time_estimate).map_err(ser_err)?,
        time_unit: time_unit.parse::<TimeUnit>().map_err(ser_err)?,
        is_timed,
        requires_subscription,
        is_custom,
    })
}
