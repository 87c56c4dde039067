use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{StatsRepository, StorageError};
use tidy_core::model::{CardId, CompletedTask, UserStats};

use super::SqliteRepository;
use super::mapping::{conn_err, parse_datetime, ser_err};

#[async_trait]
impl StatsRepository for SqliteRepository {
    async fn get_stats(&self) -> Result<Option<UserStats>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT points, current_streak, longest_streak, last_completed_at
            FROM user_stats
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let points: i64 = row.try_get("points").map_err(ser_err)?;
        let current_streak: i64 = row.try_get("current_streak").map_err(ser_err)?;
        let longest_streak: i64 = row.try_get("longest_streak").map_err(ser_err)?;
        let last_completed_at: Option<String> =
            row.try_get("last_completed_at").map_err(ser_err)?;
        let last_completed_at = last_completed_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;

        let task_rows = sqlx::query(
            r"
            SELECT card_id, completed_at, seconds_spent, was_timed, completed_in_time
            FROM completed_tasks
            ORDER BY completed_at, id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut completed_tasks = Vec::with_capacity(task_rows.len());
        for row in task_rows {
            let card_id: String = row.try_get("card_id").map_err(ser_err)?;
            let completed_at: String = row.try_get("completed_at").map_err(ser_err)?;
            let seconds_spent: i64 = row.try_get("seconds_spent").map_err(ser_err)?;
            let was_timed: bool = row.try_get("was_timed").map_err(ser_err)?;
            let completed_in_time: bool = row.try_get("completed_in_time").map_err(ser_err)?;

            completed_tasks.push(CompletedTask {
                card_id: CardId::new(card_id),
                completed_at: parse_datetime(&completed_at)?,
                seconds_spent: u32::try_from(seconds_spent).map_err(ser_err)?,
                was_timed,
                completed_in_time,
            });
        }

        let badge_rows = sqlx::query("SELECT badge_id FROM unlocked_badges")
            .fetch_all(&self.pool)
            .await
            .map_err(conn_err)?;
        let mut unlocked_badges = Vec::with_capacity(badge_rows.len());
        for row in badge_rows {
            let id: String = row.try_get("badge_id").map_err(ser_err)?;
            unlocked_badges.push(id);
        }

        Ok(Some(UserStats::from_persisted(
            u32::try_from(points).map_err(ser_err)?,
            u32::try_from(current_streak).map_err(ser_err)?,
            u32::try_from(longest_streak).map_err(ser_err)?,
            last_completed_at,
            completed_tasks,
            unlocked_badges,
        )))
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        sqlx::query(
            r"
            INSERT INTO user_stats (id, points, current_streak, longest_streak, last_completed_at)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                points = excluded.points,
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                last_completed_at = excluded.last_completed_at
            ",
        )
        .bind(i64::from(stats.points()))
        .bind(i64::from(stats.current_streak()))
        .bind(i64::from(stats.longest_streak()))
        .bind(stats.last_completed_at().map(|t| t.to_rfc3339()))
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        sqlx::query("DELETE FROM completed_tasks")
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;
        for task in stats.completed_tasks() {
            sqlx::query(
                r"
                INSERT INTO completed_tasks
                    (card_id, completed_at, seconds_spent, was_timed, completed_in_time)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(task.card_id.as_str())
            .bind(task.completed_at.to_rfc3339())
            .bind(i64::from(task.seconds_spent))
            .bind(task.was_timed)
            .bind(task.completed_in_time)
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;
        }

        sqlx::query("DELETE FROM unlocked_badges")
            .execute(&mut *tx)
            .await
            .map_err(conn_err)?;
        for badge_id in stats.unlocked_badges() {
            sqlx::query("INSERT INTO unlocked_badges (badge_id) VALUES (?1)")
                .bind(badge_id)
                .execute(&mut *tx)
                .await
                .map_err(conn_err)?;
        }

        tx.commit().await.map_err(conn_err)?;
        Ok(())
    }
}
