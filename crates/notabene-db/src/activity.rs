//! Note activity audit log repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notabene_core::{new_v7, ActivityRepository, Error, NoteActivity, Result};

/// PostgreSQL implementation of ActivityRepository.
pub struct PgActivityRepository {
    pool: Pool<Postgres>,
}

impl PgActivityRepository {
    /// Create a new PgActivityRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn record(
        &self,
        note_id: Uuid,
        actor_id: Option<Uuid>,
        action: &str,
        meta: Option<JsonValue>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO note_activity (id, note_id, actor_id, action, at_utc, meta)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{}'::jsonb))",
        )
        .bind(new_v7())
        .bind(note_id)
        .bind(actor_id)
        .bind(action)
        .bind(Utc::now())
        .bind(meta)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_for_note(&self, note_id: Uuid, limit: i64) -> Result<Vec<NoteActivity>> {
        let rows = sqlx::query(
            "SELECT id, note_id, actor_id, action, at_utc, meta
             FROM note_activity
             WHERE note_id = $1
             ORDER BY at_utc DESC
             LIMIT $2",
        )
        .bind(note_id)
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let entries = rows
            .into_iter()
            .map(|row| NoteActivity {
                id: row.get("id"),
                note_id: row.get("note_id"),
                actor_id: row.get("actor_id"),
                action: row.get("action"),
                at_utc: row.get("at_utc"),
                meta: row.get("meta"),
            })
            .collect();

        Ok(entries)
    }
}
