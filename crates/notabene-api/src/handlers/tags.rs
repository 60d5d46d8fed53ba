//! Tag HTTP handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};
use notabene_core::TagRepository;

/// List all tags with usage counts.
pub async fn list_tags(
    State(state): State<AppState>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state.db.tags.list().await?;
    Ok(Json(tags))
}
