//! Runtime configuration loaded from environment variables.

use notabene_core::{Error, Result};

/// Application configuration.
///
/// Required: `DATABASE_URL`, `JWT_SECRET`. Everything else has a default
/// or degrades to a local-development adapter (see `main.rs`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Address the server binds to.
    pub bind_addr: String,
    /// HS256 signing secret for session JWTs.
    pub jwt_secret: String,
    /// Email domain allowed to log in (compared against the part after `@`).
    pub allowed_email_domain: String,
    /// Base URL used to build magic links.
    pub public_base_url: String,
    /// Outbound mail provider endpoint; unset falls back to log-only mail.
    pub mail_api_url: Option<String>,
    /// Media host upload endpoint; unset falls back to local disk storage.
    pub media_upload_url: Option<String>,
    /// Directory for the local-disk media fallback.
    pub media_dir: String,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is required".to_string()))?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| Error::Config("JWT_SECRET is required".to_string()))?;
        if jwt_secret.len() < 32 {
            return Err(Error::Config(
                "JWT_SECRET must be at least 32 bytes".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string()),
            jwt_secret,
            allowed_email_domain: std::env::var("ALLOWED_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "stud.ase.ro".to_string()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            mail_api_url: std::env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
            media_upload_url: std::env::var("MEDIA_UPLOAD_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            media_dir: std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
        })
    }
}
