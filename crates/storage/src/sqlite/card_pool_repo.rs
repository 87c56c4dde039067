use async_trait::async_trait;

use crate::repository::{CardPoolRepository, StorageError};
use tidy_core::model::{Card, CardId};

use super::SqliteRepository;
use super::mapping::{card_from_row, conn_err};

async fn insert_card(
    tx: &mut sqlx::SqliteConnection,
    card: &Card,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO cards (
            id, category, secondary_category, task, comment, difficulty,
            time_estimate, time_unit, is_timed, requires_subscription, is_custom
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(id) DO UPDATE SET
            category = excluded.category,
            secondary_category = excluded.secondary_category,
            task = excluded.task,
            comment = excluded.comment,
            difficulty = excluded.difficulty,
            time_estimate = excluded.time_estimate,
            time_unit = excluded.time_unit,
            is_timed = excluded.is_timed,
            requires_subscription = excluded.requires_subscription,
            is_custom = excluded.is_custom
        ",
    )
    .bind(card.id.as_str())
    .bind(card.category.as_str())
    .bind(card.secondary_category.as_ref().map(|c| c.as_str()))
    .bind(&card.task)
    .bind(&card.comment)
    .bind(card.difficulty.as_str())
    .bind(i64::from(card.time_estimate))
    .bind(card.time_unit.as_str())
    .bind(card.is_timed)
    .bind(card.requires_subscription)
    .bind(card.is_custom)
    .execute(tx)
    .await?;
    Ok(())
}

#[async_trait]
impl CardPoolRepository for SqliteRepository {
    async fn replace_pool(&self, cards: &[Card]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query("DELETE FROM cards WHERE is_custom = 0")
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;

        for card in cards {
            insert_card(&mut *tx, card).await.map_err(conn_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        Ok(())
    }

    async fn upsert_card(&self, card: &Card) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await.map_err(conn_err)?;
        insert_card(&mut *conn, card).await.map_err(conn_err)
    }

    async fn delete_card(&self, id: &CardId) -> Result<(), StorageError> {
        let row = sqlx::query("SELECT is_custom FROM cards WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn_err)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound);
        };
        let is_custom: bool = sqlx::Row::try_get(&row, "is_custom").map_err(conn_err)?;
        if !is_custom {
            return Err(StorageError::Conflict);
        }

        sqlx::query("DELETE FROM cards WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn_err)?;
        Ok(())
    }

    async fn all_cards(&self) -> Result<Vec<Card>, StorageError> {
        let rows = sqlx::query("SELECT * FROM cards ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(conn_err)?;

        rows.iter().map(card_from_row).collect()
    }
}
