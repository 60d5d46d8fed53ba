//! Authentication HTTP handlers: magic-link login and session issuance.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::auth::{issue_token, validate_email_domain, RequireAuth};
use crate::{ApiError, AppState};
use notabene_core::{LoginTokenRepository, UserRepository};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
}

/// Start a magic-link login: validate the email domain, upsert the
/// account, and dispatch a single-use link.
///
/// # Returns
/// - 202 Accepted once the link is handed to the mail adapter
/// - 400 Bad Request for a malformed address
/// - 403 Forbidden for a disallowed domain
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email_domain(&body.email, &state.config.allowed_email_domain)?;

    let user = state.db.users.upsert_by_email(&body.email).await?;
    let secret = state.db.login_tokens.issue(user.id).await?;

    let link = format!(
        "{}/auth/verify?token={}",
        state.config.public_base_url.trim_end_matches('/'),
        secret
    );
    state.mailer.send_login_link(&user.email, &link).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "sent" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub token: String,
}

/// Exchange a magic-link token for a seven-day session JWT.
///
/// The login token is single-use; a second exchange with the same token
/// returns 401.
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.db.login_tokens.consume(&body.token).await?;
    state.db.users.touch_last_login(user_id).await?;
    let user = state.db.users.fetch(user_id).await?;

    let (token, expires_at) = issue_token(&state.config.jwt_secret, user.id, &user.email)?;

    Ok(Json(serde_json::json!({
        "token": token,
        "expires_at": expires_at,
        "user": user,
    })))
}

/// Return the authenticated user.
pub async fn me(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.db.users.fetch(auth.user_id).await?;
    Ok(Json(user))
}
