//! Share grant repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notabene_core::{new_v7, Error, Result, SharePermission, ShareRepository, SharedNote};

use crate::notes::record_activity_tx;

/// PostgreSQL implementation of ShareRepository.
pub struct PgShareRepository {
    pool: Pool<Postgres>,
}

impl PgShareRepository {
    /// Create a new PgShareRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for PgShareRepository {
    async fn create(
        &self,
        note_id: Uuid,
        shared_with: Uuid,
        permission: SharePermission,
    ) -> Result<Uuid> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            "INSERT INTO shared_note (id, note_id, shared_with, permission, created_at_utc)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (note_id, shared_with)
                 DO UPDATE SET permission = EXCLUDED.permission
             RETURNING id",
        )
        .bind(new_v7())
        .bind(note_id)
        .bind(shared_with)
        .bind(permission.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        record_activity_tx(
            &mut tx,
            note_id,
            None,
            "share",
            Some(serde_json::json!({
                "shared_with": shared_with,
                "permission": permission.as_str(),
            })),
        )
        .await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(row.get("id"))
    }

    async fn revoke(&self, note_id: Uuid, shared_with: Uuid) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM shared_note WHERE note_id = $1 AND shared_with = $2")
                .bind(note_id)
                .bind(shared_with)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "No share on note {} for user {}",
                note_id, shared_with
            )));
        }
        Ok(())
    }

    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<SharedNote>> {
        let rows = sqlx::query(
            "SELECT id, note_id, shared_with, permission, created_at_utc
             FROM shared_note WHERE note_id = $1 ORDER BY created_at_utc",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter()
            .map(|row| {
                let permission: SharePermission =
                    row.get::<String, _>("permission").parse()?;
                Ok(SharedNote {
                    id: row.get("id"),
                    note_id: row.get("note_id"),
                    shared_with: row.get("shared_with"),
                    permission,
                    created_at_utc: row.get("created_at_utc"),
                })
            })
            .collect()
    }
}
