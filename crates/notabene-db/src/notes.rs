//! Note repository implementation.
//!
//! All content derivation happens here: every write of `raw_content` runs
//! the richtext pipeline inside the same transaction, so `html_content`,
//! `plain_text`, and `keywords` can never drift from the source text.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use notabene_core::{
    extract_keywords, new_v7, richtext, CreateNoteRequest, Error, ListNotesRequest,
    ListNotesResponse, Note, NoteAccess, NoteRepository, NoteSummary, Result, SourceType,
    UpdateNoteRequest, DEFAULT_KEYWORD_LIMIT,
};

use crate::tags::validate_tag_name;

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Derive the stored content columns from raw markup.
fn derive_content(raw: &str) -> (String, String, Vec<String>) {
    let sanitized = richtext::sanitize(raw);
    let html = richtext::to_html(&sanitized);
    let plain = richtext::to_plain_text(&sanitized);
    let keywords = extract_keywords(&plain, DEFAULT_KEYWORD_LIMIT);
    (html, plain, keywords)
}

// =============================================================================
// HELPER FUNCTIONS FOR LIST QUERY BUILDING
// =============================================================================

/// Add the optional list filters to the query string.
fn add_note_filters(
    query: &mut String,
    param_idx: &mut usize,
    has_subject: bool,
    has_tag: bool,
    has_public: bool,
) {
    if has_subject {
        query.push_str(&format!("AND n.subject_id = ${} ", param_idx));
        *param_idx += 1;
    }
    if has_tag {
        query.push_str(&format!(
            "AND EXISTS (SELECT 1 FROM note_tag nt WHERE nt.note_id = n.id AND LOWER(nt.tag_name) = LOWER(${})) ",
            param_idx
        ));
        *param_idx += 1;
    }
    if has_public {
        query.push_str(&format!("AND n.is_public = ${} ", param_idx));
        *param_idx += 1;
    }
}

/// Macro to bind ListNotesRequest filter parameters to a query.
macro_rules! bind_note_filters {
    ($query:expr, $req:expr) => {{
        let mut q = $query;
        if let Some(subject_id) = &$req.subject_id {
            q = q.bind(subject_id);
        }
        if let Some(tag) = &$req.tag {
            q = q.bind(tag);
        }
        if let Some(is_public) = &$req.is_public {
            q = q.bind(is_public);
        }
        q
    }};
}

/// Map a database row to a NoteSummary.
pub(crate) fn map_row_to_note_summary(row: sqlx::postgres::PgRow) -> NoteSummary {
    let plain_text: String = row.get("plain_text");
    let snippet = plain_text.chars().take(200).collect();

    let tags_str: Option<String> = row.get("tags");
    let tags = tags_str
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').map(String::from).collect())
        .unwrap_or_default();

    NoteSummary {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        subject_id: row.get("subject_id"),
        title: row.get("title"),
        snippet,
        keywords: row.get("keywords"),
        is_public: row.get("is_public"),
        course_date: row.get("course_date"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
        tags,
    }
}

/// Columns selected for summary rows, shared by the list queries.
pub(crate) const SUMMARY_COLUMNS: &str = "n.id, n.owner_id, n.subject_id, n.title, n.plain_text, \
     n.keywords, n.is_public, n.course_date, n.created_at_utc, n.updated_at_utc, \
     (SELECT string_agg(tag_name, ',' ORDER BY tag_name) FROM note_tag WHERE note_id = n.id) as tags";

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Uuid> {
        if req.title.trim().is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }
        if req.raw_content.trim().is_empty() {
            return Err(Error::InvalidInput("Content is required".to_string()));
        }
        if let Some(tags) = &req.tags {
            for tag in tags {
                validate_tag_name(tag).map_err(Error::InvalidInput)?;
            }
        }

        let note_id = new_v7();
        let now = Utc::now();
        let (html, plain, keywords) = derive_content(&req.raw_content);

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO note (id, owner_id, subject_id, title, raw_content, html_content,
                               plain_text, keywords, is_public, course_date, source_type,
                               source_url, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)",
        )
        .bind(note_id)
        .bind(owner_id)
        .bind(req.subject_id)
        .bind(req.title.trim())
        .bind(&req.raw_content)
        .bind(&html)
        .bind(&plain)
        .bind(&keywords)
        .bind(req.is_public)
        .bind(req.course_date)
        .bind(req.source_type.map(|s| s.as_str()))
        .bind(&req.source_url)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if let Some(tags) = &req.tags {
            for tag in tags {
                let tag = tag.to_lowercase();
                sqlx::query(
                    "INSERT INTO tag (name, created_at_utc) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(&tag)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;

                sqlx::query(
                    "INSERT INTO note_tag (note_id, tag_name) VALUES ($1, $2)
                     ON CONFLICT DO NOTHING",
                )
                .bind(note_id)
                .bind(&tag)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
            }
        }

        record_activity_tx(&mut tx, note_id, Some(owner_id), "create", None).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(note_id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(
            "SELECT id, owner_id, subject_id, title, raw_content, html_content, plain_text,
                    keywords, is_public, course_date, source_type, source_url,
                    created_at_utc, updated_at_utc
             FROM note WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::NoteNotFound(id))?;

        let tags: Vec<String> =
            sqlx::query("SELECT tag_name FROM note_tag WHERE note_id = $1 ORDER BY tag_name")
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?
                .into_iter()
                .map(|r| r.get("tag_name"))
                .collect();

        let source_type = row
            .get::<Option<String>, _>("source_type")
            .map(|s| s.parse::<SourceType>())
            .transpose()?;

        Ok(Note {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            subject_id: row.get("subject_id"),
            title: row.get("title"),
            raw_content: row.get("raw_content"),
            html_content: row.get("html_content"),
            plain_text: row.get("plain_text"),
            keywords: row.get("keywords"),
            is_public: row.get("is_public"),
            course_date: row.get("course_date"),
            source_type,
            source_url: row.get("source_url"),
            created_at_utc: row.get("created_at_utc"),
            updated_at_utc: row.get("updated_at_utc"),
            tags,
        })
    }

    async fn list(&self, owner_id: Uuid, req: ListNotesRequest) -> Result<ListNotesResponse> {
        let limit = req.limit.unwrap_or(50).clamp(1, 100);
        let offset = req.offset.unwrap_or(0).max(0);

        // Count query
        let mut count_query =
            "SELECT COUNT(*) FROM note n WHERE n.owner_id = $1 AND n.deleted_at IS NULL "
                .to_string();
        let mut param_idx = 2;
        add_note_filters(
            &mut count_query,
            &mut param_idx,
            req.subject_id.is_some(),
            req.tag.is_some(),
            req.is_public.is_some(),
        );

        let total: i64 = {
            let q = sqlx::query_scalar(&count_query).bind(owner_id);
            let q = bind_note_filters!(q, req);
            q.fetch_one(&self.pool).await.map_err(Error::Database)?
        };

        // Page query
        let mut notes_query = format!(
            "SELECT {} FROM note n WHERE n.owner_id = $1 AND n.deleted_at IS NULL ",
            SUMMARY_COLUMNS
        );
        param_idx = 2;
        add_note_filters(
            &mut notes_query,
            &mut param_idx,
            req.subject_id.is_some(),
            req.tag.is_some(),
            req.is_public.is_some(),
        );
        notes_query.push_str(&format!(
            "ORDER BY n.created_at_utc DESC LIMIT ${} OFFSET ${}",
            param_idx,
            param_idx + 1
        ));

        let rows = {
            let mut q = sqlx::query(&notes_query).bind(owner_id);
            q = bind_note_filters!(q, req);
            q = q.bind(limit).bind(offset);
            q.fetch_all(&self.pool).await.map_err(Error::Database)?
        };

        let notes = rows.into_iter().map(map_row_to_note_summary).collect();
        Ok(ListNotesResponse { notes, total })
    }

    async fn list_shared_with(&self, user_id: Uuid) -> Result<Vec<NoteSummary>> {
        let query = format!(
            "SELECT {} FROM note n
             JOIN shared_note s ON s.note_id = n.id
             WHERE s.shared_with = $1 AND n.deleted_at IS NULL
             ORDER BY s.created_at_utc DESC",
            SUMMARY_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_note_summary).collect())
    }

    async fn update(&self, id: Uuid, actor_id: Uuid, req: UpdateNoteRequest) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let current = sqlx::query(
            "SELECT title, raw_content, subject_id, is_public, course_date, source_type, source_url
             FROM note WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::NoteNotFound(id))?;

        let title = match &req.title {
            Some(t) if t.trim().is_empty() => {
                return Err(Error::InvalidInput("Title cannot be empty".to_string()))
            }
            Some(t) => t.trim().to_string(),
            None => current.get("title"),
        };
        let content_changed = req.raw_content.is_some();
        let raw_content: String = req
            .raw_content
            .clone()
            .unwrap_or_else(|| current.get("raw_content"));
        if raw_content.trim().is_empty() {
            return Err(Error::InvalidInput("Content cannot be empty".to_string()));
        }
        let subject_id = req.subject_id.or_else(|| current.get("subject_id"));
        let is_public = req.is_public.unwrap_or_else(|| current.get("is_public"));
        let course_date = req.course_date.or_else(|| current.get("course_date"));
        let source_type = match req.source_type {
            Some(s) => Some(s.as_str().to_string()),
            None => current.get("source_type"),
        };
        let source_url = req.source_url.clone().or_else(|| current.get("source_url"));

        let (html, plain, keywords) = derive_content(&raw_content);

        sqlx::query(
            "UPDATE note SET title = $1, raw_content = $2, html_content = $3, plain_text = $4,
                             keywords = $5, subject_id = $6, is_public = $7, course_date = $8,
                             source_type = $9, source_url = $10, updated_at_utc = $11
             WHERE id = $12",
        )
        .bind(&title)
        .bind(&raw_content)
        .bind(&html)
        .bind(&plain)
        .bind(&keywords)
        .bind(subject_id)
        .bind(is_public)
        .bind(course_date)
        .bind(&source_type)
        .bind(&source_url)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        record_activity_tx(
            &mut tx,
            id,
            Some(actor_id),
            "edit",
            Some(serde_json::json!({ "content_changed": content_changed })),
        )
        .await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, actor_id: Uuid) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result =
            sqlx::query("UPDATE note SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }

        record_activity_tx(&mut tx, id, Some(actor_id), "delete", None).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM note WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn resolve_access(&self, note_id: Uuid, user_id: Uuid) -> Result<NoteAccess> {
        let row = sqlx::query(
            r#"SELECT
                 n.owner_id,
                 n.is_public,
                 (SELECT s.permission FROM shared_note s
                  WHERE s.note_id = n.id AND s.shared_with = $2) AS share_permission,
                 EXISTS(
                     SELECT 1 FROM group_note gn
                     JOIN study_group g ON g.id = gn.group_id
                     LEFT JOIN group_member gm
                         ON gm.group_id = gn.group_id AND gm.user_id = $2
                     WHERE gn.note_id = n.id
                       AND (g.creator_id = $2 OR gm.user_id IS NOT NULL)
                 ) AS group_member,
                 EXISTS(
                     SELECT 1 FROM group_note gn
                     JOIN study_group g ON g.id = gn.group_id
                     LEFT JOIN group_member gm
                         ON gm.group_id = gn.group_id AND gm.user_id = $2
                     WHERE gn.note_id = n.id
                       AND (g.creator_id = $2 OR gm.permission = 'edit')
                 ) AS group_edit
               FROM note n
               WHERE n.id = $1 AND n.deleted_at IS NULL"#,
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::NoteNotFound(note_id))?;

        let owner_id: Uuid = row.get("owner_id");
        let share = row
            .get::<Option<String>, _>("share_permission")
            .map(|s| s.parse())
            .transpose()?;

        Ok(NoteAccess {
            is_owner: owner_id == user_id,
            is_public: row.get("is_public"),
            share,
            group_member: row.get("group_member"),
            group_edit: row.get("group_edit"),
        })
    }
}

/// Insert an activity row within an existing transaction.
pub(crate) async fn record_activity_tx(
    tx: &mut Transaction<'_, Postgres>,
    note_id: Uuid,
    actor_id: Option<Uuid>,
    action: &str,
    meta: Option<serde_json::Value>,
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
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_content_sanitizes_before_rendering() {
        let (html, plain, _) = derive_content("<script>alert(1)</script>**bold**");
        assert!(!html.to_lowercase().contains("script"));
        assert_eq!(html, "<b>bold</b>");
        assert_eq!(plain, "bold");
    }

    #[test]
    fn test_derive_content_extracts_keywords() {
        let (_, _, keywords) = derive_content("contabilitate contabilitate bilanț");
        assert_eq!(keywords[0], "contabilitate");
    }

    #[test]
    fn test_add_note_filters_param_numbering() {
        let mut query = String::new();
        let mut idx = 2;
        add_note_filters(&mut query, &mut idx, true, true, false);
        assert!(query.contains("$2"));
        assert!(query.contains("$3"));
        assert_eq!(idx, 4);
    }
}
