use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{ProgressRepository, StorageError};
use tidy_core::model::{CardId, DailyProgress, DayKey};

use super::SqliteRepository;
use super::mapping::{conn_err, ser_err};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self) -> Result<Option<DailyProgress>, StorageError> {
        let row = sqlx::query("SELECT day FROM daily_progress WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw_day: String = row.try_get("day").map_err(ser_err)?;
        let day = raw_day.parse::<DayKey>().map_err(ser_err)?;

        let completed_rows = sqlx::query("SELECT card_id FROM completed_cards")
            .fetch_all(&self.pool)
            .await
            .map_err(conn_err)?;

        let mut completed = BTreeSet::new();
        for row in completed_rows {
            let id: String = row.try_get("card_id").map_err(ser_err)?;
            completed.insert(CardId::new(id));
        }

        Ok(Some(DailyProgress::from_persisted(day, completed)))
    }

    async fn save_progress(&self, progress: &DailyProgress) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query(
            r"
            INSERT INTO daily_progress (id, day) VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET day = excluded.day
            ",
        )
        .bind(progress.day().to_string())
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        sqlx::query("DELETE FROM completed_cards")
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;

        for id in progress.completed() {
            sqlx::query("INSERT INTO completed_cards (card_id) VALUES (?1)")
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        Ok(())
    }
}
