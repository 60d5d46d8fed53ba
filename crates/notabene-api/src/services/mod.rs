//! Outbound service adapters (mail delivery, media host).

pub mod mailer;
pub mod media;

pub use mailer::{HttpMailSender, LogMailSender};
pub use media::{DiskMediaStore, HttpMediaStore};
