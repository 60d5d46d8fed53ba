//! Attachment metadata repository implementation.
//!
//! Only descriptive rows live here; the file bytes are on the external
//! media host by the time `insert` runs.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notabene_core::{
    new_v7, Attachment, AttachmentRepository, CreateAttachmentRequest, Error, Result,
};

use crate::notes::record_activity_tx;

/// PostgreSQL implementation of AttachmentRepository.
pub struct PgAttachmentRepository {
    pool: Pool<Postgres>,
}

impl PgAttachmentRepository {
    /// Create a new PgAttachmentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_attachment(row: sqlx::postgres::PgRow) -> Attachment {
    Attachment {
        id: row.get("id"),
        note_id: row.get("note_id"),
        uploader_id: row.get("uploader_id"),
        file_name: row.get("file_name"),
        mime_type: row.get("mime_type"),
        size_bytes: row.get("size_bytes"),
        url: row.get("url"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    async fn insert(&self, req: CreateAttachmentRequest) -> Result<Uuid> {
        let id = new_v7();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO attachment (id, note_id, uploader_id, file_name, mime_type,
                                     size_bytes, url, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(req.note_id)
        .bind(req.uploader_id)
        .bind(&req.file_name)
        .bind(&req.mime_type)
        .bind(req.size_bytes)
        .bind(&req.url)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        record_activity_tx(
            &mut tx,
            req.note_id,
            Some(req.uploader_id),
            "attach",
            Some(serde_json::json!({ "file_name": req.file_name })),
        )
        .await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Attachment>> {
        let row = sqlx::query(
            "SELECT id, note_id, uploader_id, file_name, mime_type, size_bytes, url,
                    created_at_utc
             FROM attachment WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(map_row_to_attachment))
    }

    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Attachment>> {
        let rows = sqlx::query(
            "SELECT id, note_id, uploader_id, file_name, mime_type, size_bytes, url,
                    created_at_utc
             FROM attachment WHERE note_id = $1 ORDER BY created_at_utc",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_attachment).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM attachment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Attachment {} not found", id)));
        }
        Ok(())
    }
}
