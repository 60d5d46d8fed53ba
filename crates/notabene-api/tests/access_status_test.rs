//! Access policy to HTTP status contract.
//!
//! The handler convention: a caller who cannot view a note gets 404 (its
//! existence is never revealed); a caller who can view but not mutate
//! gets 403; deletion is owner-only. These tests pin the predicate side
//! of that contract for the scenarios in the permission matrix.

use notabene_core::{NoteAccess, SharePermission};

/// A stranger probing a private note must take the 404 path, never 200.
#[test]
fn test_private_note_invisible_to_strangers() {
    let access = NoteAccess::default();
    assert!(!access.can_view());
}

/// A read share fetches fine but any update takes the 403 path.
#[test]
fn test_read_share_fetch_then_update() {
    let access = NoteAccess {
        share: Some(SharePermission::Read),
        ..Default::default()
    };
    assert!(access.can_view(), "fetch should succeed");
    assert!(!access.can_edit(), "update should be refused");
}

/// An edit share still cannot delete: the delete check is ownership, not
/// the share permission.
#[test]
fn test_edit_share_never_deletes() {
    let access = NoteAccess {
        share: Some(SharePermission::Edit),
        ..Default::default()
    };
    assert!(access.can_edit());
    assert!(!access.can_delete());

    let owner = NoteAccess::owner();
    assert!(owner.can_delete());
}

/// Group membership grants read; mutation needs the explicit edit
/// permission.
#[test]
fn test_group_membership_defaults_to_read() {
    let member = NoteAccess {
        group_member: true,
        ..Default::default()
    };
    assert!(member.can_view());
    assert!(!member.can_edit());

    let editor = NoteAccess {
        group_member: true,
        group_edit: true,
        ..Default::default()
    };
    assert!(editor.can_edit());
    assert!(!editor.can_delete());
}

/// A public note is world-readable but not world-writable.
#[test]
fn test_public_note_read_only_for_strangers() {
    let access = NoteAccess {
        is_public: true,
        ..Default::default()
    };
    assert!(access.can_view());
    assert!(!access.can_edit());
    assert!(!access.can_delete());
}
