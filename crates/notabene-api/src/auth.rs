//! Session tokens and authentication extractors.
//!
//! Sessions are stateless HS256 JWTs with a seven-day expiry, issued after
//! a magic-link login token is consumed. The extractors validate the
//! Bearer header and hand the authenticated user id to handlers.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, AppState};
use notabene_core::{Error, Result};

/// Session lifetime.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// JWT claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    /// User email at issue time.
    pub email: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Issue a session token for a user. Returns the token and its expiry.
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
) -> Result<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expires_at = now + Duration::days(TOKEN_TTL_DAYS);
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign session token: {}", e)))?;

    Ok((token, expires_at))
}

/// Decode and validate a session token.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| Error::Unauthorized(format!("invalid session token: {}", e)))
}

/// Check an email address against the allow-listed domain.
pub fn validate_email_domain(email: &str, allowed_domain: &str) -> Result<()> {
    let email = email.trim();
    let (_, domain) = email
        .split_once('@')
        .filter(|(local, domain)| !local.is_empty() && !domain.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("'{}' is not an email address", email)))?;

    if !domain.eq_ignore_ascii_case(allowed_domain) {
        return Err(Error::Forbidden(format!(
            "Only @{} addresses may log in",
            allowed_domain
        )));
    }
    Ok(())
}

/// Extractor that requires a valid session token.
///
/// Usage:
/// ```ignore
/// async fn my_handler(auth: RequireAuth) -> impl IntoResponse {
///     let user_id = auth.user_id;
///     // ... handler logic
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub user_id: Uuid,
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                header.trim_start_matches("Bearer ").trim()
            }
            _ => {
                return Err(ApiError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            }
        };

        let claims = decode_token(&state.config.jwt_secret, token)?;

        Ok(RequireAuth {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
