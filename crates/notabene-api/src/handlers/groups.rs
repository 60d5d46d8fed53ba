//! Study group HTTP handlers.
//!
//! Role (admin/editor/viewer) governs member management; the read/edit
//! content permission governs adding and removing notes. The two are
//! independent axes. The creator is untouchable: cannot leave, be
//! removed, or be demoted, enforced in the repository layer.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::{ApiError, AppState, ListResponse};
use notabene_core::{
    CreateGroupRequest, GroupRepository, GroupRole, NoteRepository, SharePermission,
};

/// List the caller's groups: created and joined, fetched concurrently.
pub async fn list_groups(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let (created, joined) = tokio::try_join!(
        state.db.groups.list_created(auth.user_id),
        state.db.groups.list_joined(auth.user_id),
    )?;

    Ok(Json(serde_json::json!({
        "created": created,
        "joined": joined,
    })))
}

/// Create a study group. The caller becomes the implicit admin/edit
/// member in the same transaction.
pub async fn create_group(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.db.groups.create(auth.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Get a group's metadata. Visible to anyone so the join flow can render;
/// member lists and notes stay member-only.
pub async fn get_group(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.db.groups.fetch(id).await?;
    Ok(Json(group))
}

#[derive(Debug, Deserialize)]
pub struct JoinGroupBody {
    /// Required for private groups.
    pub password: Option<String>,
}

/// Join a group. Private groups check the password hash.
pub async fn join_group(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<JoinGroupBody>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .groups
        .join(id, auth.user_id, body.password.as_deref())
        .await?;
    Ok(Json(serde_json::json!({ "status": "joined" })))
}

/// Leave a group. The creator is refused (403).
pub async fn leave_group(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.groups.leave(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List members, creator first. Member only.
pub async fn list_members(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.groups.resolve_access(id, auth.user_id).await?;
    if !access.is_member() {
        return Err(ApiError::Forbidden("Members only".to_string()));
    }

    let members = state.db.groups.members(id).await?;
    Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberBody {
    pub role: Option<GroupRole>,
    pub permission: Option<SharePermission>,
}

/// Change a member's role and/or content permission. Admin only; the
/// creator is refused as a target.
pub async fn update_member(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateMemberBody>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.groups.resolve_access(id, auth.user_id).await?;
    if !access.is_member() {
        return Err(ApiError::Forbidden("Members only".to_string()));
    }
    if !access.can_manage_members() {
        return Err(ApiError::Forbidden(
            "Only group admins can manage members".to_string(),
        ));
    }
    if body.role.is_none() && body.permission.is_none() {
        return Err(ApiError::BadRequest(
            "Nothing to update: provide role and/or permission".to_string(),
        ));
    }

    state
        .db
        .groups
        .update_member(id, user_id, body.role, body.permission)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a member. Admin only; the creator is refused as a target.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.groups.resolve_access(id, auth.user_id).await?;
    if !access.is_member() {
        return Err(ApiError::Forbidden("Members only".to_string()));
    }
    if !access.can_manage_members() {
        return Err(ApiError::Forbidden(
            "Only group admins can manage members".to_string(),
        ));
    }

    state.db.groups.remove_member(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct GroupNotesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List the notes linked into a group. Member read.
pub async fn list_group_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Query(query): Query<GroupNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.groups.resolve_access(id, auth.user_id).await?;
    if !access.is_member() {
        return Err(ApiError::Forbidden("Members only".to_string()));
    }

    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);
    let response = state.db.groups.list_notes(id, limit, offset).await?;

    Ok(Json(ListResponse::new(
        response.notes,
        response.total as usize,
        limit as usize,
        offset as usize,
    )))
}

#[derive(Debug, Deserialize)]
pub struct AddGroupNoteBody {
    pub note_id: Uuid,
}

/// Link a note into a group. Requires group edit permission, and the note
/// must itself be viewable by the caller.
pub async fn add_group_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<AddGroupNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.groups.resolve_access(id, auth.user_id).await?;
    if !access.is_member() {
        return Err(ApiError::Forbidden("Members only".to_string()));
    }
    if !access.can_edit_notes() {
        return Err(ApiError::Forbidden(
            "You need edit permission to add notes to this group".to_string(),
        ));
    }

    let note_access = state
        .db
        .notes
        .resolve_access(body.note_id, auth.user_id)
        .await?;
    if !note_access.can_view() {
        return Err(ApiError::NotFound(format!(
            "Note {} not found",
            body.note_id
        )));
    }

    state
        .db
        .groups
        .add_note(id, body.note_id, auth.user_id)
        .await?;
    Ok(StatusCode::CREATED)
}

/// Unlink a note from a group. Requires group edit permission.
pub async fn remove_group_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.groups.resolve_access(id, auth.user_id).await?;
    if !access.is_member() {
        return Err(ApiError::Forbidden("Members only".to_string()));
    }
    if !access.can_edit_notes() {
        return Err(ApiError::Forbidden(
            "You need edit permission to remove notes from this group".to_string(),
        ));
    }

    state.db.groups.remove_note(id, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
