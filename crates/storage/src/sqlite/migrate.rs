use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: the card pool, criteria selections, daily
/// progress with its completed-card rows, and the gamification tables.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS cards (
                    id TEXT PRIMARY KEY,
                    category TEXT NOT NULL,
                    secondary_category TEXT,
                    task TEXT NOT NULL,
                    comment TEXT NOT NULL,
                    difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
                    time_estimate INTEGER NOT NULL CHECK (time_estimate > 0),
                    time_unit TEXT NOT NULL CHECK (time_unit IN ('minutes', 'hours')),
                    is_timed INTEGER NOT NULL,
                    requires_subscription INTEGER NOT NULL,
                    is_custom INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS criteria_categories (
                    category TEXT PRIMARY KEY
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS criteria_difficulties (
                    difficulty TEXT PRIMARY KEY CHECK (difficulty IN ('easy', 'medium', 'hard'))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS daily_progress (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    day TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS completed_cards (
                    card_id TEXT PRIMARY KEY
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_stats (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    points INTEGER NOT NULL CHECK (points >= 0),
                    current_streak INTEGER NOT NULL CHECK (current_streak >= 0),
                    longest_streak INTEGER NOT NULL CHECK (longest_streak >= 0),
                    last_completed_at TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS completed_tasks (
                    id INTEGER PRIMARY KEY,
                    card_id TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    seconds_spent INTEGER NOT NULL CHECK (seconds_spent >= 0),
                    was_timed INTEGER NOT NULL,
                    completed_in_time INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS unlocked_badges (
                    badge_id TEXT PRIMARY KEY
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_cards_category ON cards(category);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_completed_tasks_completed_at
                ON completed_tasks(completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
            .bind(1_i64)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
