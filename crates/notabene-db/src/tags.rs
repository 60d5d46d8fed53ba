//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notabene_core::{Error, Result, Tag, TagRepository};

/// Validate a tag name.
///
/// Rules:
/// - Length between 1-100 characters
/// - Allowed characters: alphanumeric, hyphens (-), underscores (_)
/// - No spaces or other special characters
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.len() > 100 {
        return Err("Tag name must be 100 characters or less".to_string());
    }

    let invalid_chars: Vec<char> = tag
        .chars()
        .filter(|c| !c.is_alphanumeric() && *c != '-' && *c != '_')
        .collect();

    if !invalid_chars.is_empty() {
        let chars_display: String = invalid_chars
            .iter()
            .take(5)
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "Tag contains invalid characters: {}. Only alphanumeric characters, hyphens, and underscores are allowed",
            chars_display
        ));
    }

    Ok(())
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT
                t.name,
                t.created_at_utc,
                COUNT(n.id) as note_count
            FROM tag t
            LEFT JOIN note_tag nt ON t.name = nt.tag_name
            LEFT JOIN note n ON nt.note_id = n.id AND n.deleted_at IS NULL
            GROUP BY t.name, t.created_at_utc
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let tags = rows
            .into_iter()
            .map(|row| Tag {
                name: row.get("name"),
                created_at_utc: row.get("created_at_utc"),
                note_count: row.get("note_count"),
            })
            .collect();

        Ok(tags)
    }

    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<String>> {
        let rows =
            sqlx::query("SELECT tag_name FROM note_tag WHERE note_id = $1 ORDER BY tag_name")
                .bind(note_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        let tags = rows.into_iter().map(|row| row.get("tag_name")).collect();
        Ok(tags)
    }

    async fn set_for_note(&self, note_id: Uuid, tags: Vec<String>) -> Result<()> {
        // Validate all tag names first
        for tag_name in &tags {
            validate_tag_name(tag_name).map_err(Error::InvalidInput)?;
        }

        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Remove existing tags
        sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        // Add new tags
        for tag_name in tags {
            let tag_name = tag_name.to_lowercase();

            // Ensure tag exists
            sqlx::query(
                "INSERT INTO tag (name, created_at_utc) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(&tag_name)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            // Link tag to note
            sqlx::query(
                "INSERT INTO note_tag (note_id, tag_name) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(note_id)
            .bind(&tag_name)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag_name_accepts_simple_names() {
        assert!(validate_tag_name("contabilitate").is_ok());
        assert!(validate_tag_name("anul-2").is_ok());
        assert!(validate_tag_name("sem_1").is_ok());
    }

    #[test]
    fn test_validate_tag_name_rejects_empty_and_long() {
        assert!(validate_tag_name("").is_err());
        assert!(validate_tag_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_tag_name_rejects_special_chars() {
        let err = validate_tag_name("bad tag!").unwrap_err();
        assert!(err.contains("invalid characters"));
    }
}
