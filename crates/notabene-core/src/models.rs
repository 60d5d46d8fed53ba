//! Core data models for notabene.
//!
//! These types are shared across all notabene crates and represent the
//! persisted domain entities.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

// =============================================================================
// USER TYPES
// =============================================================================

/// A registered user. Accounts are created implicitly on the first
/// magic-link login for an allow-listed email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub created_at_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A complete note as returned by the detail endpoint.
///
/// `html_content`, `plain_text`, and `keywords` are derived from
/// `raw_content` by the richtext pipeline in the same transaction that
/// writes `raw_content`; they are never accepted from clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub title: String,
    pub raw_content: String,
    pub html_content: String,
    pub plain_text: String,
    pub keywords: Vec<String>,
    pub is_public: bool,
    pub course_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Summary view of a note for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub title: String,
    pub snippet: String,
    pub keywords: Vec<String>,
    pub is_public: bool,
    pub course_date: Option<NaiveDate>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Where a note's content originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Lecture,
    Seminar,
    Book,
    Web,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Lecture => "lecture",
            SourceType::Seminar => "seminar",
            SourceType::Book => "book",
            SourceType::Web => "web",
        }
    }
}

impl FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lecture" => Ok(SourceType::Lecture),
            "seminar" => Ok(SourceType::Seminar),
            "book" => Ok(SourceType::Book),
            "web" => Ok(SourceType::Web),
            other => Err(Error::InvalidInput(format!(
                "source_type must be one of lecture, seminar, book, web (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SUBJECT TYPES
// =============================================================================

/// A course/subject a user files notes under. Names are unique per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    /// Number of non-deleted notes filed under this subject.
    pub note_count: i64,
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A tag with usage count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
    pub note_count: i64,
}

// =============================================================================
// SHARING TYPES
// =============================================================================

/// Per-note grant level. Stored as "read"/"edit" and validated through
/// this enum before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    Read,
    Edit,
}

impl SharePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::Read => "read",
            SharePermission::Edit => "edit",
        }
    }
}

impl FromStr for SharePermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(SharePermission::Read),
            "edit" => Ok(SharePermission::Edit),
            other => Err(Error::InvalidInput(format!(
                "permission must be 'read' or 'edit' (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A share grant on a note for a specific user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedNote {
    pub id: Uuid,
    pub note_id: Uuid,
    pub shared_with: Uuid,
    pub permission: SharePermission,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// STUDY GROUP TYPES
// =============================================================================

/// Group-level label used for member management rights. Distinct from the
/// read/edit content permission carried by [`SharePermission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Editor,
    Viewer,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Admin => "admin",
            GroupRole::Editor => "editor",
            GroupRole::Viewer => "viewer",
        }
    }
}

impl FromStr for GroupRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(GroupRole::Admin),
            "editor" => Ok(GroupRole::Editor),
            "viewer" => Ok(GroupRole::Viewer),
            other => Err(Error::InvalidInput(format!(
                "role must be one of admin, editor, viewer (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A study group. Private groups require a password to join; the hash is
/// never serialized out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyGroup {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_private: bool,
    pub created_at_utc: DateTime<Utc>,
    pub member_count: i64,
}

/// A group membership row.
///
/// The creator's row is written in the same transaction as the group
/// itself (role admin, permission edit) and is immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRole,
    pub permission: SharePermission,
    pub joined_at_utc: DateTime<Utc>,
    pub display_name: String,
    pub email: String,
}

// =============================================================================
// ATTACHMENT TYPES
// =============================================================================

/// A file attached to a note. The bytes live on the external media host;
/// only the URL and descriptive metadata are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub note_id: Uuid,
    pub uploader_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// ACTIVITY TYPES
// =============================================================================

/// An audit log entry for a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteActivity {
    pub id: Uuid,
    pub note_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub at_utc: DateTime<Utc>,
    pub meta: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_permission_roundtrip() {
        assert_eq!(
            "read".parse::<SharePermission>().unwrap(),
            SharePermission::Read
        );
        assert_eq!(
            "edit".parse::<SharePermission>().unwrap(),
            SharePermission::Edit
        );
        assert_eq!(SharePermission::Edit.as_str(), "edit");
    }

    #[test]
    fn test_share_permission_rejects_unknown() {
        let err = "write".parse::<SharePermission>().unwrap_err();
        match err {
            Error::InvalidInput(msg) => assert!(msg.contains("write")),
            _ => panic!("Expected InvalidInput"),
        }
    }

    #[test]
    fn test_share_permission_is_case_sensitive() {
        // Stored values are lowercase; anything else never reaches the DB.
        assert!("Read".parse::<SharePermission>().is_err());
        assert!("EDIT".parse::<SharePermission>().is_err());
    }

    #[test]
    fn test_group_role_roundtrip() {
        for (s, role) in [
            ("admin", GroupRole::Admin),
            ("editor", GroupRole::Editor),
            ("viewer", GroupRole::Viewer),
        ] {
            assert_eq!(s.parse::<GroupRole>().unwrap(), role);
            assert_eq!(role.as_str(), s);
        }
    }

    #[test]
    fn test_group_role_rejects_unknown() {
        assert!("owner".parse::<GroupRole>().is_err());
        assert!("".parse::<GroupRole>().is_err());
    }

    #[test]
    fn test_source_type_roundtrip() {
        for (s, st) in [
            ("lecture", SourceType::Lecture),
            ("seminar", SourceType::Seminar),
            ("book", SourceType::Book),
            ("web", SourceType::Web),
        ] {
            assert_eq!(s.parse::<SourceType>().unwrap(), st);
            assert_eq!(st.as_str(), s);
        }
        assert!("podcast".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_share_permission_serde_lowercase() {
        let json = serde_json::to_string(&SharePermission::Edit).unwrap();
        assert_eq!(json, "\"edit\"");
        let back: SharePermission = serde_json::from_str("\"read\"").unwrap();
        assert_eq!(back, SharePermission::Read);
    }
}
