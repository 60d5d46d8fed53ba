//! Router construction and middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::handlers::{attachments, auth, groups, notes, subjects, tags};
use crate::AppState;

/// Request body ceiling, above the attachment limit so multipart overhead
/// never trips it first.
const BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful
/// for log correlation when debugging production incidents.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Parse allowed origins from a comma-separated value.
///
/// Strict origin whitelisting: an unset or empty value falls back to the
/// local development origins rather than allowing any website to call the
/// API.
pub fn parse_allowed_origins(value: Option<&str>) -> Vec<HeaderValue> {
    let origins_str = value.unwrap_or("http://localhost:3000,http://localhost:5173");

    if origins_str.trim().is_empty() {
        return vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the full application router with the middleware stack.
pub fn build_router(state: AppState) -> Router {
    let origins = parse_allowed_origins(std::env::var("ALLOWED_ORIGINS").ok().as_deref());
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/auth/me", get(auth::me))
        // Notes CRUD
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route("/api/notes/shared-with-me", get(notes::list_shared_with_me))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route(
            "/api/notes/:id/tags",
            get(notes::get_note_tags).put(notes::set_note_tags),
        )
        .route("/api/notes/:id/activity", get(notes::get_note_activity))
        // Sharing
        .route(
            "/api/notes/:id/shares",
            get(notes::list_shares).post(notes::create_share),
        )
        .route("/api/notes/:id/shares/:user_id", delete(notes::delete_share))
        // Attachments
        .route(
            "/api/notes/:id/attachments",
            get(attachments::list_attachments).post(attachments::upload_attachment),
        )
        .route("/api/attachments/:id", delete(attachments::delete_attachment))
        // Subjects
        .route(
            "/api/subjects",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route(
            "/api/subjects/:id",
            get(subjects::get_subject)
                .patch(subjects::update_subject)
                .delete(subjects::delete_subject),
        )
        // Tags
        .route("/api/tags", get(tags::list_tags))
        // Study groups
        .route(
            "/api/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route("/api/groups/:id", get(groups::get_group))
        .route("/api/groups/:id/join", post(groups::join_group))
        .route("/api/groups/:id/leave", post(groups::leave_group))
        .route("/api/groups/:id/members", get(groups::list_members))
        .route(
            "/api/groups/:id/members/:user_id",
            axum::routing::patch(groups::update_member).delete(groups::remove_member),
        )
        .route(
            "/api/groups/:id/notes",
            get(groups::list_group_notes).post(groups::add_group_note),
        )
        .route(
            "/api/groups/:id/notes/:note_id",
            delete(groups::remove_group_note),
        )
        // Middleware stack
        .layer(CatchPanicLayer::new())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}
