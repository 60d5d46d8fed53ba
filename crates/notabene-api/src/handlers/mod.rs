//! HTTP handlers, one module per resource.

pub mod attachments;
pub mod auth;
pub mod groups;
pub mod notes;
pub mod subjects;
pub mod tags;
