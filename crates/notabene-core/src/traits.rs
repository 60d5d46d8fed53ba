//! Core traits for notabene abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. Repository traits
//! are implemented by the Postgres layer; the outbound adapters
//! ([`MailSender`], [`MediaStore`]) by the API crate.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use uuid::Uuid;

use crate::access::{GroupAccess, NoteAccess};
use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch or create the user for an email address. The email is
    /// lowercased before lookup; the default display name is the local
    /// part of the address.
    async fn upsert_by_email(&self, email: &str) -> Result<User>;

    /// Fetch a user by id.
    async fn fetch(&self, id: Uuid) -> Result<User>;

    /// Look up a user by email.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Record a successful login.
    async fn touch_last_login(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// LOGIN TOKEN REPOSITORY
// =============================================================================

/// Repository for single-use magic-link login tokens.
///
/// Only the SHA-256 hash of a secret is stored; the plaintext exists
/// exactly once, inside the emailed link.
#[async_trait]
pub trait LoginTokenRepository: Send + Sync {
    /// Issue a new login token for a user and return the plaintext secret.
    async fn issue(&self, user_id: Uuid) -> Result<String>;

    /// Consume a secret: validates existence, expiry, and single use, then
    /// returns the user id it was issued for.
    async fn consume(&self, secret: &str) -> Result<Uuid>;

    /// Delete expired and consumed tokens.
    async fn purge_expired(&self) -> Result<u64>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub raw_content: String,
    pub subject_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_public: bool,
    pub course_date: Option<NaiveDate>,
    pub source_type: Option<SourceType>,
    pub source_url: Option<String>,
}

/// Request for updating a note. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub raw_content: Option<String>,
    pub subject_id: Option<Uuid>,
    pub is_public: Option<bool>,
    pub course_date: Option<NaiveDate>,
    pub source_type: Option<SourceType>,
    pub source_url: Option<String>,
}

/// Request for listing a user's notes.
#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    /// Filter by subject.
    pub subject_id: Option<Uuid>,
    /// Filter by tag name.
    pub tag: Option<String>,
    /// Filter by visibility.
    pub is_public: Option<bool>,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Pagination offset.
    pub offset: Option<i64>,
}

/// Response for listing notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub notes: Vec<NoteSummary>,
    pub total: i64,
}

/// Repository for note CRUD operations.
///
/// Every mutation derives `html_content`, `plain_text`, and `keywords`
/// from `raw_content` inside its transaction and writes an activity row.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note owned by `owner_id`.
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Uuid>;

    /// Fetch a full note by id.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// List notes owned by `owner_id` with filtering and pagination.
    async fn list(&self, owner_id: Uuid, req: ListNotesRequest) -> Result<ListNotesResponse>;

    /// List notes shared with `user_id` by other users.
    async fn list_shared_with(&self, user_id: Uuid) -> Result<Vec<NoteSummary>>;

    /// Apply a partial update on behalf of `actor_id`.
    async fn update(&self, id: Uuid, actor_id: Uuid, req: UpdateNoteRequest) -> Result<()>;

    /// Soft-delete a note on behalf of `actor_id`.
    async fn soft_delete(&self, id: Uuid, actor_id: Uuid) -> Result<()>;

    /// Check if a note exists and is not deleted.
    async fn exists(&self, id: Uuid) -> Result<bool>;

    /// Gather the caller's access facts for a note in one query.
    /// Returns [`crate::Error::NoteNotFound`] for missing/deleted notes.
    async fn resolve_access(&self, note_id: Uuid, user_id: Uuid) -> Result<NoteAccess>;
}

// =============================================================================
// SUBJECT REPOSITORY
// =============================================================================

/// Repository for subjects (per-user course folders).
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Create a subject. Names are unique per owner.
    async fn create(&self, owner_id: Uuid, name: &str, description: Option<&str>) -> Result<Uuid>;

    /// Get a subject by id.
    async fn get(&self, id: Uuid) -> Result<Option<Subject>>;

    /// List a user's subjects with note counts.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Subject>>;

    /// Update name and/or description.
    async fn update(&self, id: Uuid, name: Option<&str>, description: Option<&str>) -> Result<()>;

    /// Delete a subject (notes under it become unfiled).
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// TAG REPOSITORY
// =============================================================================

/// Repository for tag operations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List all tags with usage counts.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Get all tags for a note.
    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<String>>;

    /// Set tags for a note (replace all).
    async fn set_for_note(&self, note_id: Uuid, tags: Vec<String>) -> Result<()>;
}

// =============================================================================
// SHARE REPOSITORY
// =============================================================================

/// Repository for per-note share grants.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Grant `shared_with` access to a note. Re-sharing with the same
    /// user replaces the previous permission.
    async fn create(
        &self,
        note_id: Uuid,
        shared_with: Uuid,
        permission: SharePermission,
    ) -> Result<Uuid>;

    /// Revoke a grant.
    async fn revoke(&self, note_id: Uuid, shared_with: Uuid) -> Result<()>;

    /// List grants on a note.
    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<SharedNote>>;
}

// =============================================================================
// GROUP REPOSITORY
// =============================================================================

/// Request for creating a study group.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    /// Required when `is_private` is true; hashed before storage.
    pub password: Option<String>,
}

/// Repository for study groups, their members, and their linked notes.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Create a group. The creator's admin/edit membership row is written
    /// in the same transaction.
    async fn create(&self, creator_id: Uuid, req: CreateGroupRequest) -> Result<Uuid>;

    /// Fetch a group by id.
    async fn fetch(&self, id: Uuid) -> Result<StudyGroup>;

    /// List groups created by a user.
    async fn list_created(&self, user_id: Uuid) -> Result<Vec<StudyGroup>>;

    /// List groups a user has joined (excluding ones they created).
    async fn list_joined(&self, user_id: Uuid) -> Result<Vec<StudyGroup>>;

    /// Join a group. Private groups verify the password against the
    /// stored hash. Joining twice is a no-op.
    async fn join(&self, group_id: Uuid, user_id: Uuid, password: Option<&str>) -> Result<()>;

    /// Leave a group. The creator is refused.
    async fn leave(&self, group_id: Uuid, user_id: Uuid) -> Result<()>;

    /// List members, creator first.
    async fn members(&self, group_id: Uuid) -> Result<Vec<GroupMember>>;

    /// Change a member's role and/or content permission. The creator is
    /// refused as a target.
    async fn update_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: Option<GroupRole>,
        permission: Option<SharePermission>,
    ) -> Result<()>;

    /// Remove a member. The creator is refused as a target.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<()>;

    /// Link a note into the group.
    async fn add_note(&self, group_id: Uuid, note_id: Uuid, added_by: Uuid) -> Result<()>;

    /// Unlink a note from the group.
    async fn remove_note(&self, group_id: Uuid, note_id: Uuid) -> Result<()>;

    /// List notes linked into the group.
    async fn list_notes(&self, group_id: Uuid, limit: i64, offset: i64)
        -> Result<ListNotesResponse>;

    /// Gather the caller's access facts for a group in one query.
    /// Returns [`crate::Error::GroupNotFound`] for missing groups.
    async fn resolve_access(&self, group_id: Uuid, user_id: Uuid) -> Result<GroupAccess>;
}

// =============================================================================
// ATTACHMENT REPOSITORY
// =============================================================================

/// Request for persisting an attachment row after the media host upload.
#[derive(Debug, Clone)]
pub struct CreateAttachmentRequest {
    pub note_id: Uuid,
    pub uploader_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
}

/// Repository for attachment metadata.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Persist an attachment row.
    async fn insert(&self, req: CreateAttachmentRequest) -> Result<Uuid>;

    /// Get an attachment by id.
    async fn get(&self, id: Uuid) -> Result<Option<Attachment>>;

    /// List attachments on a note.
    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Attachment>>;

    /// Delete an attachment row.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// ACTIVITY REPOSITORY
// =============================================================================

/// Repository for the per-note audit log.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Record an action against a note.
    async fn record(
        &self,
        note_id: Uuid,
        actor_id: Option<Uuid>,
        action: &str,
        meta: Option<JsonValue>,
    ) -> Result<()>;

    /// List the most recent activity for a note, newest first.
    async fn list_for_note(&self, note_id: Uuid, limit: i64) -> Result<Vec<NoteActivity>>;
}

// =============================================================================
// OUTBOUND ADAPTERS
// =============================================================================

/// Outbound transport for magic-link login mail.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver the login link to an address.
    async fn send_login_link(&self, email: &str, link: &str) -> Result<()>;
}

/// External media host for attachment bytes.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Forward a staged file to the media host and return its public URL.
    async fn store(&self, file_name: &str, mime_type: &str, staged: &Path) -> Result<String>;
}
