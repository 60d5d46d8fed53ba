//! Attachment HTTP handlers.
//!
//! Uploads go through three steps: safety validation (extension blocklist
//! and magic bytes), staging to temp disk, then forwarding to the media
//! host. Only the returned URL and descriptive metadata are persisted.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};
use notabene_core::{
    detect_content_type, new_v7, validate_upload, AttachmentRepository, CreateAttachmentRequest,
    NoteRepository,
};

/// Maximum accepted upload size.
pub const MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

fn note_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Note {} not found", id))
}

/// Upload a file and attach it to a note. Requires edit rights on the
/// note.
pub async fn upload_attachment(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(note_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(note_id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(note_id));
    }
    if !access.can_edit() {
        return Err(ApiError::Forbidden(
            "You do not have edit permission on this note".to_string(),
        ));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let claimed_mime = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let validation = validate_upload(&file_name, &data, MAX_ATTACHMENT_BYTES);
        if !validation.allowed {
            return Err(ApiError::BadRequest(
                validation
                    .block_reason
                    .unwrap_or_else(|| "Upload rejected".to_string()),
            ));
        }
        let mime_type = detect_content_type(&data, &claimed_mime);

        // Stage to temp disk, forward, then clean up regardless of outcome.
        let staged = std::env::temp_dir().join(format!("nb-upload-{}", new_v7()));
        tokio::fs::write(&staged, &data)
            .await
            .map_err(notabene_core::Error::Io)?;

        let stored = state.media.store(&file_name, &mime_type, &staged).await;
        let _ = tokio::fs::remove_file(&staged).await;
        let url = stored?;

        let id = state
            .db
            .attachments
            .insert(CreateAttachmentRequest {
                note_id,
                uploader_id: auth.user_id,
                file_name,
                mime_type,
                size_bytes: data.len() as i64,
                url: url.clone(),
            })
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id, "url": url })),
        ));
    }

    Err(ApiError::BadRequest(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// List the attachments on a note.
pub async fn list_attachments(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.db.notes.resolve_access(note_id, auth.user_id).await?;
    if !access.can_view() {
        return Err(note_not_found(note_id));
    }

    let attachments = state.db.attachments.list_for_note(note_id).await?;
    Ok(Json(attachments))
}

/// Delete an attachment. Allowed for the uploader and the note owner.
pub async fn delete_attachment(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let attachment = state
        .db
        .attachments
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Attachment {} not found", id)))?;

    if attachment.uploader_id != auth.user_id {
        let access = state
            .db
            .notes
            .resolve_access(attachment.note_id, auth.user_id)
            .await?;
        if !access.can_view() {
            return Err(ApiError::NotFound(format!("Attachment {} not found", id)));
        }
        if !access.is_owner {
            return Err(ApiError::Forbidden(
                "Only the uploader or the note owner can delete an attachment".to_string(),
            ));
        }
    }

    state.db.attachments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
