//! Subject repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notabene_core::{new_v7, Error, Result, Subject, SubjectRepository};

/// PostgreSQL implementation of SubjectRepository.
pub struct PgSubjectRepository {
    pool: Pool<Postgres>,
}

impl PgSubjectRepository {
    /// Create a new PgSubjectRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_subject(row: sqlx::postgres::PgRow) -> Subject {
    Subject {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at_utc: row.get("created_at_utc"),
        note_count: row.get("note_count"),
    }
}

#[async_trait]
impl SubjectRepository for PgSubjectRepository {
    async fn create(&self, owner_id: Uuid, name: &str, description: Option<&str>) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Subject name is required".to_string()));
        }
        if name.len() > 200 {
            return Err(Error::InvalidInput(
                "Subject name must be 200 characters or less".to_string(),
            ));
        }

        let id = new_v7();
        sqlx::query(
            "INSERT INTO subject (id, owner_id, name, description, created_at_utc)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Subject>> {
        let row = sqlx::query(
            "SELECT s.id, s.owner_id, s.name, s.description, s.created_at_utc,
                    COUNT(n.id) as note_count
             FROM subject s
             LEFT JOIN note n ON n.subject_id = s.id AND n.deleted_at IS NULL
             WHERE s.id = $1
             GROUP BY s.id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(map_row_to_subject))
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Subject>> {
        let rows = sqlx::query(
            "SELECT s.id, s.owner_id, s.name, s.description, s.created_at_utc,
                    COUNT(n.id) as note_count
             FROM subject s
             LEFT JOIN note n ON n.subject_id = s.id AND n.deleted_at IS NULL
             WHERE s.owner_id = $1
             GROUP BY s.id
             ORDER BY s.name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_subject).collect())
    }

    async fn update(&self, id: Uuid, name: Option<&str>, description: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput(
                    "Subject name cannot be empty".to_string(),
                ));
            }
        }

        let result = sqlx::query(
            "UPDATE subject SET name = COALESCE($1, name), description = COALESCE($2, description)
             WHERE id = $3",
        )
        .bind(name.map(str::trim))
        .bind(description)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Subject {} not found", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Notes under the subject fall back to unfiled via ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM subject WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Subject {} not found", id)));
        }
        Ok(())
    }
}
