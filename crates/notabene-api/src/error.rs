//! HTTP error mapping.
//!
//! Every handler returns `Result<impl IntoResponse, ApiError>`; a single
//! `From` impl turns repository errors into fixed status codes, so the
//! catch-and-map behavior is uniform across the API.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// API-level error with a fixed HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
    Database(notabene_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<notabene_core::Error> for ApiError {
    fn from(err: notabene_core::Error) -> Self {
        match &err {
            notabene_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            notabene_core::Error::NoteNotFound(id) => {
                ApiError::NotFound(format!("Note {} not found", id))
            }
            notabene_core::Error::GroupNotFound(id) => {
                ApiError::NotFound(format!("Group {} not found", id))
            }
            notabene_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            notabene_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            notabene_core::Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            notabene_core::Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    // Friendlier messages for the constraints users can hit
                    let friendly_msg = if msg.contains("subject_owner_id_name_key") {
                        "A subject with this name already exists".to_string()
                    } else if msg.contains("app_user_email_key") {
                        "An account with this email already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
