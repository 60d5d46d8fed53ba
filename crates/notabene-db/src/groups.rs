//! Study group repository implementation.
//!
//! The creator invariant is enforced here, below the HTTP layer: the
//! creator's admin/edit membership row is written in the same transaction
//! as the group, and every member mutation refuses the creator as a
//! target.

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notabene_core::{
    new_v7, CreateGroupRequest, Error, GroupAccess, GroupMember, GroupRepository, GroupRole,
    ListNotesResponse, Result, SharePermission, StudyGroup,
};

use crate::notes::{map_row_to_note_summary, record_activity_tx, SUMMARY_COLUMNS};

/// PostgreSQL implementation of GroupRepository.
pub struct PgGroupRepository {
    pool: Pool<Postgres>,
}

impl PgGroupRepository {
    /// Create a new PgGroupRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Hash a group password using SHA256.
    fn hash_password(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn map_row_to_group(row: sqlx::postgres::PgRow) -> StudyGroup {
    StudyGroup {
        id: row.get("id"),
        creator_id: row.get("creator_id"),
        name: row.get("name"),
        description: row.get("description"),
        is_private: row.get("is_private"),
        created_at_utc: row.get("created_at_utc"),
        member_count: row.get("member_count"),
    }
}

/// Columns selected for group rows, shared by the list queries.
const GROUP_COLUMNS: &str = "g.id, g.creator_id, g.name, g.description, g.is_private, \
     g.created_at_utc, \
     (SELECT COUNT(*) FROM group_member gm WHERE gm.group_id = g.id) as member_count";

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn create(&self, creator_id: Uuid, req: CreateGroupRequest) -> Result<Uuid> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Group name is required".to_string()));
        }
        let password_hash = if req.is_private {
            let password = req.password.as_deref().unwrap_or("");
            if password.is_empty() {
                return Err(Error::InvalidInput(
                    "Private groups require a password".to_string(),
                ));
            }
            Some(Self::hash_password(password))
        } else {
            None
        };

        let group_id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO study_group (id, creator_id, name, description, is_private,
                                      password_hash, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(group_id)
        .bind(creator_id)
        .bind(name)
        .bind(&req.description)
        .bind(req.is_private)
        .bind(&password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // The creator's membership row is part of the group's creation.
        sqlx::query(
            "INSERT INTO group_member (group_id, user_id, role, permission, joined_at_utc)
             VALUES ($1, $2, 'admin', 'edit', $3)",
        )
        .bind(group_id)
        .bind(creator_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(group_id)
    }

    async fn fetch(&self, id: Uuid) -> Result<StudyGroup> {
        let query = format!("SELECT {} FROM study_group g WHERE g.id = $1", GROUP_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::GroupNotFound(id))?;

        Ok(map_row_to_group(row))
    }

    async fn list_created(&self, user_id: Uuid) -> Result<Vec<StudyGroup>> {
        let query = format!(
            "SELECT {} FROM study_group g WHERE g.creator_id = $1 ORDER BY g.created_at_utc DESC",
            GROUP_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_group).collect())
    }

    async fn list_joined(&self, user_id: Uuid) -> Result<Vec<StudyGroup>> {
        let query = format!(
            "SELECT {} FROM study_group g
             JOIN group_member gm ON gm.group_id = g.id
             WHERE gm.user_id = $1 AND g.creator_id <> $1
             ORDER BY gm.joined_at_utc DESC",
            GROUP_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_group).collect())
    }

    async fn join(&self, group_id: Uuid, user_id: Uuid, password: Option<&str>) -> Result<()> {
        let row = sqlx::query(
            "SELECT is_private, password_hash FROM study_group WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::GroupNotFound(group_id))?;

        let is_private: bool = row.get("is_private");
        if is_private {
            let stored: Option<String> = row.get("password_hash");
            let supplied = password.map(Self::hash_password);
            if stored.is_none() || supplied != stored {
                return Err(Error::Forbidden("Incorrect group password".to_string()));
            }
        }

        // Default membership: viewer role, read permission. Joining twice
        // (or the creator joining) is a no-op.
        sqlx::query(
            "INSERT INTO group_member (group_id, user_id, joined_at_utc)
             VALUES ($1, $2, $3)
             ON CONFLICT (group_id, user_id) DO NOTHING",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn leave(&self, group_id: Uuid, user_id: Uuid) -> Result<()> {
        let creator_id: Uuid =
            sqlx::query_scalar("SELECT creator_id FROM study_group WHERE id = $1")
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?
                .ok_or(Error::GroupNotFound(group_id))?;

        if creator_id == user_id {
            return Err(Error::Forbidden(
                "The group creator cannot leave the group".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM group_member WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "User {} is not a member of group {}",
                user_id, group_id
            )));
        }
        Ok(())
    }

    async fn members(&self, group_id: Uuid) -> Result<Vec<GroupMember>> {
        if !group_exists(&self.pool, group_id).await? {
            return Err(Error::GroupNotFound(group_id));
        }

        let rows = sqlx::query(
            "SELECT gm.group_id, gm.user_id, gm.role, gm.permission, gm.joined_at_utc,
                    u.display_name, u.email,
                    (gm.user_id = g.creator_id) as is_creator
             FROM group_member gm
             JOIN study_group g ON g.id = gm.group_id
             JOIN app_user u ON u.id = gm.user_id
             WHERE gm.group_id = $1
             ORDER BY is_creator DESC, gm.joined_at_utc",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter()
            .map(|row| {
                let role: GroupRole = row.get::<String, _>("role").parse()?;
                let permission: SharePermission = row.get::<String, _>("permission").parse()?;
                Ok(GroupMember {
                    group_id: row.get("group_id"),
                    user_id: row.get("user_id"),
                    role,
                    permission,
                    joined_at_utc: row.get("joined_at_utc"),
                    display_name: row.get("display_name"),
                    email: row.get("email"),
                })
            })
            .collect()
    }

    async fn update_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: Option<GroupRole>,
        permission: Option<SharePermission>,
    ) -> Result<()> {
        let creator_id: Uuid =
            sqlx::query_scalar("SELECT creator_id FROM study_group WHERE id = $1")
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?
                .ok_or(Error::GroupNotFound(group_id))?;

        if creator_id == user_id {
            return Err(Error::Forbidden(
                "The group creator cannot be demoted".to_string(),
            ));
        }

        let result = sqlx::query(
            "UPDATE group_member
             SET role = COALESCE($1, role), permission = COALESCE($2, permission)
             WHERE group_id = $3 AND user_id = $4",
        )
        .bind(role.map(|r| r.as_str()))
        .bind(permission.map(|p| p.as_str()))
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "User {} is not a member of group {}",
                user_id, group_id
            )));
        }
        Ok(())
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<()> {
        let creator_id: Uuid =
            sqlx::query_scalar("SELECT creator_id FROM study_group WHERE id = $1")
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?
                .ok_or(Error::GroupNotFound(group_id))?;

        if creator_id == user_id {
            return Err(Error::Forbidden(
                "The group creator cannot be removed".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM group_member WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "User {} is not a member of group {}",
                user_id, group_id
            )));
        }
        Ok(())
    }

    async fn add_note(&self, group_id: Uuid, note_id: Uuid, added_by: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let inserted = sqlx::query(
            "INSERT INTO group_note (group_id, note_id, added_by, added_at_utc)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (group_id, note_id) DO NOTHING",
        )
        .bind(group_id)
        .bind(note_id)
        .bind(added_by)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if inserted.rows_affected() > 0 {
            record_activity_tx(
                &mut tx,
                note_id,
                Some(added_by),
                "share",
                Some(serde_json::json!({ "group_id": group_id })),
            )
            .await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn remove_note(&self, group_id: Uuid, note_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM group_note WHERE group_id = $1 AND note_id = $2")
            .bind(group_id)
            .bind(note_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Note {} is not in group {}",
                note_id, group_id
            )));
        }
        Ok(())
    }

    async fn list_notes(
        &self,
        group_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<ListNotesResponse> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM group_note gn
             JOIN note n ON n.id = gn.note_id
             WHERE gn.group_id = $1 AND n.deleted_at IS NULL",
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let query = format!(
            "SELECT {} FROM note n
             JOIN group_note gn ON gn.note_id = n.id
             WHERE gn.group_id = $1 AND n.deleted_at IS NULL
             ORDER BY gn.added_at_utc DESC
             LIMIT $2 OFFSET $3",
            SUMMARY_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(group_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let notes = rows.into_iter().map(map_row_to_note_summary).collect();
        Ok(ListNotesResponse { notes, total })
    }

    async fn resolve_access(&self, group_id: Uuid, user_id: Uuid) -> Result<GroupAccess> {
        let row = sqlx::query(
            "SELECT g.creator_id, gm.role, gm.permission
             FROM study_group g
             LEFT JOIN group_member gm ON gm.group_id = g.id AND gm.user_id = $2
             WHERE g.id = $1",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::GroupNotFound(group_id))?;

        let creator_id: Uuid = row.get("creator_id");
        let role = row
            .get::<Option<String>, _>("role")
            .map(|s| s.parse())
            .transpose()?;
        let permission = row
            .get::<Option<String>, _>("permission")
            .map(|s| s.parse())
            .transpose()?;

        Ok(GroupAccess {
            is_creator: creator_id == user_id,
            role,
            permission,
        })
    }
}

async fn group_exists(pool: &Pool<Postgres>, group_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM study_group WHERE id = $1)")
        .bind(group_id)
        .fetch_one(pool)
        .await
        .map_err(Error::Database)?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_deterministic_hex() {
        let a = PgGroupRepository::hash_password("parola123");
        let b = PgGroupRepository::hash_password("parola123");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, PgGroupRepository::hash_password("alta-parola"));
    }
}
