//! Note HTTP handlers: CRUD, tagging, sharing, and the activity feed.
//!
//! Access rules: a request that fails `can_view` gets 404 so private note
//! existence is never revealed; a viewable note that fails a mutation
//! check gets 403. Deletion is owner-only regardless of shares.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::{ApiError, AppState, ListResponse};
use notabene_core::{
    ActivityRepository, CreateNoteRequest, ListNotesRequest, NoteRepository, SharePermission,
    ShareRepository, TagRepository, UpdateNoteRequest, UserRepository,
};

fn note_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Note {} not found", id))
}

#[derive(Debug, Deserialize)]
pub struct ListNotesQuery {
    pub subject_id: Option<Uuid>,
    pub tag: Option<String>,
    pub is_public: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List the caller's notes with optional subject/tag/visibility filters.
pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<ListNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let req = ListNotesRequest {
        subject_id: query.subject_id,
        tag: query.tag,
        is_public: query.is_public,
        limit: Some(limit),
        offset: Some(offset),
    };
    let response = state.db.notes.list(auth.user_id, req).await?;

    Ok(Json(ListResponse::new(
        response.notes,
        response.total as usize,
        limit as usize,
        offset as usize,
    )))
}

/// Create a note. Derived content (HTML, plain text, keywords) is computed
/// server-side from `raw_content`.
pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note_id = state.db.notes.insert(auth.user_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": note_id })),
    ))
}

/// Fetch a note the caller may view. Records a `view` activity entry.
pub async fn get_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }

    let note = state.db.notes.fetch(id).await?;
    state
        .db
        .activity
        .record(id, Some(auth.user_id), "view", None)
        .await?;

    Ok(Json(note))
}

/// Update a note. Requires edit rights (ownership, an edit share, or
/// group edit permission).
pub async fn update_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }
    if !access.can_edit() {
        return Err(ApiError::Forbidden(
            "You do not have edit permission on this note".to_string(),
        ));
    }

    state.db.notes.update(id, auth.user_id, body).await?;
    let note = state.db.notes.fetch(id).await?;
    Ok(Json(note))
}

/// Delete (soft) a note. Owner only; shares and group membership never
/// grant delete rights.
pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }
    if !access.can_delete() {
        return Err(ApiError::Forbidden(
            "Only the owner can delete a note".to_string(),
        ));
    }

    state.db.notes.soft_delete(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List notes other users have shared with the caller.
pub async fn list_shared_with_me(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state.db.notes.list_shared_with(auth.user_id).await?;
    Ok(Json(notes))
}

/// Get the tags on a note.
pub async fn get_note_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }

    let tags = state.db.tags.get_for_note(id).await?;
    Ok(Json(tags))
}

#[derive(Debug, Deserialize)]
pub struct SetTagsBody {
    pub tags: Vec<String>,
}

/// Replace the tags on a note. Tagging is content mutation, so edit
/// rights are required.
pub async fn set_note_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<SetTagsBody>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }
    if !access.can_edit() {
        return Err(ApiError::Forbidden(
            "You do not have edit permission on this note".to_string(),
        ));
    }

    state.db.tags.set_for_note(id, body.tags).await?;
    let tags = state.db.tags.get_for_note(id).await?;
    Ok(Json(tags))
}

#[derive(Debug, Deserialize)]
pub struct CreateShareBody {
    /// Target user id; exactly one of `user_id`/`email` is required.
    pub user_id: Option<Uuid>,
    /// Target user email, resolved to an existing account.
    pub email: Option<String>,
    pub permission: SharePermission,
}

/// Share a note with another user. Owner only.
pub async fn create_share(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateShareBody>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }
    if !access.is_owner {
        return Err(ApiError::Forbidden(
            "Only the owner can share a note".to_string(),
        ));
    }

    let target = match (body.user_id, &body.email) {
        (Some(user_id), _) => state.db.users.fetch(user_id).await?,
        (None, Some(email)) => state
            .db
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No account for {}", email)))?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either user_id or email is required".to_string(),
            ))
        }
    };
    if target.id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot share a note with yourself".to_string(),
        ));
    }

    let share_id = state.db.shares.create(id, target.id, body.permission).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": share_id })),
    ))
}

/// List the share grants on a note. Owner only.
pub async fn list_shares(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }
    if !access.is_owner {
        return Err(ApiError::Forbidden(
            "Only the owner can list shares".to_string(),
        ));
    }

    let shares = state.db.shares.list_for_note(id).await?;
    Ok(Json(shares))
}

/// Revoke a share grant. Owner only.
pub async fn delete_share(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }
    if !access.is_owner {
        return Err(ApiError::Forbidden(
            "Only the owner can revoke shares".to_string(),
        ));
    }

    state.db.shares.revoke(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

/// List the audit log of a note. Owner only.
pub async fn get_note_activity(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(id));
    }
    if !access.is_owner {
        return Err(ApiError::Forbidden(
            "Only the owner can read the activity log".to_string(),
        ));
    }

    let entries = state
        .db
        .activity
        .list_for_note(id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(entries))
}
