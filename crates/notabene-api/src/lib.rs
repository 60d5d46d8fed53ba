//! notabene-api - HTTP API server library for notabene.
//!
//! The binary in `main.rs` wires configuration and adapters together; the
//! router, state, error mapping, and handlers live here so integration
//! tests can exercise them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

use std::sync::Arc;

use notabene_core::{MailSender, MediaStore};
use notabene_db::Database;

pub use config::AppConfig;
pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Outbound transport for magic-link mail.
    pub mailer: Arc<dyn MailSender>,
    /// External media host for attachment bytes.
    pub media: Arc<dyn MediaStore>,
    /// Runtime configuration (JWT secret, allowed email domain, URLs).
    pub config: Arc<AppConfig>,
}

/// Standardized pagination metadata for list responses.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct PaginationMeta {
    /// Total number of items matching the query (across all pages)
    pub total: usize,
    /// Maximum number of items per page (request parameter)
    pub limit: usize,
    /// Number of items skipped (request parameter)
    pub offset: usize,
    /// True if more items are available after this page
    pub has_more: bool,
}

/// Standardized list response wrapper with pagination metadata.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ListResponse<T> {
    /// The list of items for the current page
    pub data: Vec<T>,
    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T: serde::Serialize> ListResponse<T> {
    /// Create a new paginated list response. `has_more` is derived from
    /// offset, page length, and total count.
    pub fn new(data: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        let has_more = offset + data.len() < total;
        Self {
            data,
            pagination: PaginationMeta {
                total,
                limit,
                offset,
                has_more,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_has_more() {
        let resp = ListResponse::new(vec![1, 2, 3], 10, 3, 0);
        assert!(resp.pagination.has_more);

        let resp = ListResponse::new(vec![8, 9, 10], 10, 3, 7);
        assert!(!resp.pagination.has_more);
    }
}
