//! Error-to-status mapping: every repository error class lands on a fixed
//! HTTP status code.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use notabene_api::ApiError;
use notabene_core::Error;

fn status_of(err: ApiError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn test_not_found_maps_to_404() {
    assert_eq!(
        status_of(Error::NotFound("x".into()).into()),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(Error::NoteNotFound(Uuid::nil()).into()),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(Error::GroupNotFound(Uuid::nil()).into()),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_invalid_input_maps_to_400() {
    assert_eq!(
        status_of(Error::InvalidInput("bad".into()).into()),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_unauthorized_maps_to_401() {
    assert_eq!(
        status_of(Error::Unauthorized("token".into()).into()),
        StatusCode::UNAUTHORIZED
    );
}

#[test]
fn test_forbidden_maps_to_403() {
    assert_eq!(
        status_of(Error::Forbidden("owner only".into()).into()),
        StatusCode::FORBIDDEN
    );
}

#[test]
fn test_unique_violation_maps_to_409() {
    let err = Error::Database(sqlx::Error::Protocol(
        "duplicate key value violates unique constraint \"subject_owner_id_name_key\"".into(),
    ));
    assert_eq!(status_of(err.into()), StatusCode::CONFLICT);
}

#[test]
fn test_other_database_errors_map_to_500() {
    let err = Error::Database(sqlx::Error::PoolTimedOut);
    assert_eq!(status_of(err.into()), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_internal_maps_to_500() {
    assert_eq!(
        status_of(Error::Internal("boom".into()).into()),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
