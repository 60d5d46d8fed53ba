//! Access policy for notes and study groups.
//!
//! The decision core is pure: the database layer gathers the facts about a
//! caller's relationship to a note into a [`NoteAccess`] value (one query),
//! and handlers ask it what the request may do. Keeping the predicate out
//! of SQL means the rules are unit-testable without a database.
//!
//! HTTP mapping used by the API layer: failing [`NoteAccess::can_view`] is
//! reported as 404 so the existence of private notes is never revealed;
//! failing a mutation while the note is viewable is 403.

use serde::{Deserialize, Serialize};

use crate::models::{GroupRole, SharePermission};

/// Facts about one caller's relationship to one note.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NoteAccess {
    /// Caller owns the note.
    pub is_owner: bool,
    /// Note is flagged public.
    pub is_public: bool,
    /// Direct share grant for the caller, if any.
    pub share: Option<SharePermission>,
    /// Caller is the creator of, or a member of, a group the note is
    /// linked to.
    pub group_member: bool,
    /// Caller holds edit permission in at least one such group (the
    /// creator always does).
    pub group_edit: bool,
}

impl NoteAccess {
    /// Facts for the owner of a note.
    pub fn owner() -> Self {
        Self {
            is_owner: true,
            ..Default::default()
        }
    }

    /// Whether the caller may read the note.
    pub fn can_view(&self) -> bool {
        self.is_owner || self.is_public || self.share.is_some() || self.group_member
    }

    /// Whether the caller may modify the note's content or metadata.
    ///
    /// Group membership grants mutation only through an explicit edit
    /// permission; the default member permission is read.
    pub fn can_edit(&self) -> bool {
        self.is_owner || self.share == Some(SharePermission::Edit) || self.group_edit
    }

    /// Whether the caller may delete the note. Owner only: shares and
    /// group membership never grant delete rights.
    pub fn can_delete(&self) -> bool {
        self.is_owner
    }
}

/// Facts about one caller's relationship to one study group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupAccess {
    /// Caller created the group. The creator is an implicit admin/edit
    /// member and cannot be removed, demoted, or allowed to leave.
    pub is_creator: bool,
    /// Caller's membership row, if any.
    pub role: Option<GroupRole>,
    /// Caller's content permission within the group.
    pub permission: Option<SharePermission>,
}

impl GroupAccess {
    /// Non-member facts.
    pub fn none() -> Self {
        Self {
            is_creator: false,
            role: None,
            permission: None,
        }
    }

    /// Whether the caller belongs to the group at all.
    pub fn is_member(&self) -> bool {
        self.is_creator || self.role.is_some()
    }

    /// Whether the caller may manage members (role/permission changes,
    /// removal).
    pub fn can_manage_members(&self) -> bool {
        self.is_creator || self.role == Some(GroupRole::Admin)
    }

    /// Whether the caller may add or remove notes in the group.
    pub fn can_edit_notes(&self) -> bool {
        self.is_creator || self.permission == Some(SharePermission::Edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stranger_sees_nothing_on_private_note() {
        let access = NoteAccess::default();
        assert!(!access.can_view());
        assert!(!access.can_edit());
        assert!(!access.can_delete());
    }

    #[test]
    fn test_owner_has_full_control() {
        let access = NoteAccess::owner();
        assert!(access.can_view());
        assert!(access.can_edit());
        assert!(access.can_delete());
    }

    #[test]
    fn test_public_note_is_readable_not_editable() {
        let access = NoteAccess {
            is_public: true,
            ..Default::default()
        };
        assert!(access.can_view());
        assert!(!access.can_edit());
    }

    #[test]
    fn test_read_share_can_view_but_not_edit() {
        let access = NoteAccess {
            share: Some(SharePermission::Read),
            ..Default::default()
        };
        assert!(access.can_view());
        assert!(!access.can_edit());
        assert!(!access.can_delete());
    }

    #[test]
    fn test_edit_share_can_edit_but_not_delete() {
        let access = NoteAccess {
            share: Some(SharePermission::Edit),
            ..Default::default()
        };
        assert!(access.can_view());
        assert!(access.can_edit());
        assert!(!access.can_delete());
    }

    #[test]
    fn test_group_member_reads_by_default() {
        let access = NoteAccess {
            group_member: true,
            ..Default::default()
        };
        assert!(access.can_view());
        assert!(!access.can_edit());
    }

    #[test]
    fn test_group_edit_permission_allows_mutation() {
        let access = NoteAccess {
            group_member: true,
            group_edit: true,
            ..Default::default()
        };
        assert!(access.can_edit());
        assert!(!access.can_delete());
    }

    #[test]
    fn test_group_creator_manages_members() {
        let access = GroupAccess {
            is_creator: true,
            role: None,
            permission: None,
        };
        assert!(access.is_member());
        assert!(access.can_manage_members());
        assert!(access.can_edit_notes());
    }

    #[test]
    fn test_admin_manages_members() {
        let access = GroupAccess {
            is_creator: false,
            role: Some(GroupRole::Admin),
            permission: Some(SharePermission::Read),
        };
        assert!(access.can_manage_members());
        // Role and content permission are independent axes.
        assert!(!access.can_edit_notes());
    }

    #[test]
    fn test_editor_without_edit_permission_cannot_touch_notes() {
        let access = GroupAccess {
            is_creator: false,
            role: Some(GroupRole::Editor),
            permission: Some(SharePermission::Read),
        };
        assert!(access.is_member());
        assert!(!access.can_manage_members());
        assert!(!access.can_edit_notes());
    }

    #[test]
    fn test_viewer_with_edit_permission_can_touch_notes() {
        let access = GroupAccess {
            is_creator: false,
            role: Some(GroupRole::Viewer),
            permission: Some(SharePermission::Edit),
        };
        assert!(!access.can_manage_members());
        assert!(access.can_edit_notes());
    }

    #[test]
    fn test_non_member() {
        let access = GroupAccess::none();
        assert!(!access.is_member());
        assert!(!access.can_manage_members());
        assert!(!access.can_edit_notes());
    }
}
