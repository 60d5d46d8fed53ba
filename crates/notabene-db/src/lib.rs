//! # notabene-db
//!
//! PostgreSQL database layer for notabene.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - One-query access-fact resolution for the permission policy
//!
//! ## Example
//!
//! ```rust,ignore
//! use notabene_db::Database;
//! use notabene_core::{CreateNoteRequest, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notabene").await?;
//!
//!     let note_id = db.notes.insert(owner_id, CreateNoteRequest {
//!         title: "Curs 1".to_string(),
//!         raw_content: "#1 Introducere\n- definitii".to_string(),
//!         subject_id: None,
//!         tags: Some(vec!["contabilitate".to_string()]),
//!         is_public: false,
//!         course_date: None,
//!         source_type: None,
//!         source_url: None,
//!     }).await?;
//!
//!     println!("Created note: {}", note_id);
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod attachments;
pub mod groups;
pub mod login_tokens;
pub mod notes;
pub mod pool;
pub mod shares;
pub mod subjects;
pub mod tags;
pub mod users;

// Re-export core types
pub use notabene_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use activity::PgActivityRepository;
pub use attachments::PgAttachmentRepository;
pub use groups::PgGroupRepository;
pub use login_tokens::PgLoginTokenRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use shares::PgShareRepository;
pub use subjects::PgSubjectRepository;
pub use tags::{validate_tag_name, PgTagRepository};
pub use users::PgUserRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User repository.
    pub users: PgUserRepository,
    /// Magic-link login token repository.
    pub login_tokens: PgLoginTokenRepository,
    /// Note repository for CRUD and access-fact resolution.
    pub notes: PgNoteRepository,
    /// Subject repository.
    pub subjects: PgSubjectRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
    /// Per-note share grant repository.
    pub shares: PgShareRepository,
    /// Study group repository.
    pub groups: PgGroupRepository,
    /// Attachment metadata repository.
    pub attachments: PgAttachmentRepository,
    /// Per-note audit log repository.
    pub activity: PgActivityRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            login_tokens: PgLoginTokenRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            subjects: PgSubjectRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            shares: PgShareRepository::new(pool.clone()),
            groups: PgGroupRepository::new(pool.clone()),
            attachments: PgAttachmentRepository::new(pool.clone()),
            activity: PgActivityRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_done\\"), "50\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
