//! Subject HTTP handlers.
//!
//! Subjects are strictly per-user: any request against another user's
//! subject is answered with 404.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};
use notabene_core::{Subject, SubjectRepository};

fn subject_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Subject {} not found", id))
}

/// Fetch a subject and enforce ownership.
async fn owned_subject(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Subject, ApiError> {
    let subject = state
        .db
        .subjects
        .get(id)
        .await?
        .ok_or_else(|| subject_not_found(id))?;
    if subject.owner_id != user_id {
        return Err(subject_not_found(id));
    }
    Ok(subject)
}

/// List the caller's subjects.
pub async fn list_subjects(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let subjects = state.db.subjects.list(auth.user_id).await?;
    Ok(Json(subjects))
}

#[derive(Debug, Deserialize)]
pub struct CreateSubjectBody {
    pub name: String,
    pub description: Option<String>,
}

/// Create a subject.
pub async fn create_subject(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<CreateSubjectBody>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state
        .db
        .subjects
        .create(auth.user_id, &body.name, body.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Get one of the caller's subjects.
pub async fn get_subject(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subject = owned_subject(&state, id, auth.user_id).await?;
    Ok(Json(subject))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubjectBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Update a subject's name/description.
pub async fn update_subject(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSubjectBody>,
) -> Result<impl IntoResponse, ApiError> {
    owned_subject(&state, id, auth.user_id).await?;
    state
        .db
        .subjects
        .update(id, body.name.as_deref(), body.description.as_deref())
        .await?;

    let subject = owned_subject(&state, id, auth.user_id).await?;
    Ok(Json(subject))
}

/// Delete a subject. Its notes become unfiled.
pub async fn delete_subject(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    owned_subject(&state, id, auth.user_id).await?;
    state.db.subjects.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
