use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{CriteriaRepository, StorageError};
use tidy_core::model::{Category, Difficulty, SelectionCriteria};

use super::SqliteRepository;
use super::mapping::{conn_err, ser_err};

#[async_trait]
impl CriteriaRepository for SqliteRepository {
    async fn get_criteria(&self) -> Result<Option<SelectionCriteria>, StorageError> {
        let category_rows = sqlx::query("SELECT category FROM criteria_categories")
            .fetch_all(&self.pool)
            .await
            .map_err(conn_err)?;
        let difficulty_rows = sqlx::query("SELECT difficulty FROM criteria_difficulties")
            .fetch_all(&self.pool)
            .await
            .map_err(conn_err)?;

        if category_rows.is_empty() && difficulty_rows.is_empty() {
            return Ok(None);
        }

        let mut categories = BTreeSet::new();
        for row in category_rows {
            let raw: String = row.try_get("category").map_err(ser_err)?;
            categories.insert(Category::new(raw).map_err(ser_err)?);
        }

        let mut difficulties = BTreeSet::new();
        for row in difficulty_rows {
            let raw: String = row.try_get("difficulty").map_err(ser_err)?;
            difficulties.insert(raw.parse::<Difficulty>().map_err(ser_err)?);
        }

        Ok(Some(SelectionCriteria::from_persisted(
            categories,
            difficulties,
        )))
    }

    async fn save_criteria(&self, criteria: &SelectionCriteria) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query("DELETE FROM criteria_categories")
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;
        sqlx::query("DELETE FROM criteria_difficulties")
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;

        for category in criteria.categories() {
            sqlx::query("INSERT INTO criteria_categories (category) VALUES (?1)")
                .bind(category.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn_err)?;
        }
        for difficulty in criteria.difficulties() {
            sqlx::query("INSERT INTO criteria_difficulties (difficulty) VALUES (?1)")
                .bind(difficulty.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        Ok(())
    }
}
