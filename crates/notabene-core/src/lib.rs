//! # notabene-core
//!
//! Core types, traits, and the text pipeline for the notabene note
//! service.
//!
//! This crate provides the foundational data structures, the rich-text
//! transform, the access policy, and the trait definitions that the other
//! notabene crates depend on.

pub mod access;
pub mod error;
pub mod file_safety;
pub mod keywords;
pub mod logging;
pub mod models;
pub mod richtext;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use access::{GroupAccess, NoteAccess};
pub use error::{Error, Result};
pub use file_safety::{detect_content_type, validate_upload, ValidationResult};
pub use keywords::{extract_keywords, DEFAULT_KEYWORD_LIMIT};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
