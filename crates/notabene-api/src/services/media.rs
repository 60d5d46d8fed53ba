//! Media host adapters for attachment bytes.
//!
//! Uploads are staged to temp disk by the handler, then forwarded here.
//! The HTTP adapter posts the staged file to the external media host and
//! persists only the returned URL; the disk adapter is the local
//! development fallback.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use notabene_core::{Error, MediaStore, Result};

/// Response shape of the media host upload endpoint.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Forwards staged files to an external media host over HTTP.
pub struct HttpMediaStore {
    client: reqwest::Client,
    upload_url: String,
}

impl HttpMediaStore {
    /// Create a store posting to the given upload endpoint.
    pub fn new(upload_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
        }
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    async fn store(&self, file_name: &str, mime_type: &str, staged: &Path) -> Result<String> {
        let bytes = tokio::fs::read(staged).await?;
        let size = bytes.len();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| Error::Request(format!("invalid mime type '{}': {}", mime_type, e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "media host returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response.json().await?;

        info!(
            subsystem = "media",
            op = "store",
            upload_bytes = size,
            url = %body.url,
            "Attachment forwarded to media host"
        );
        Ok(body.url)
    }
}

/// Development fallback: copies the staged file into a local directory and
/// returns a path-based URL under the public base URL.
pub struct DiskMediaStore {
    dir: std::path::PathBuf,
    public_base_url: String,
}

impl DiskMediaStore {
    /// Create a store writing into `dir`.
    pub fn new(dir: impl Into<std::path::PathBuf>, public_base_url: String) -> Self {
        Self {
            dir: dir.into(),
            public_base_url,
        }
    }
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn store(&self, file_name: &str, _mime_type: &str, staged: &Path) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Prefix with a fresh id so colliding client file names never overwrite.
        let stored_name = format!("{}-{}", notabene_core::new_v7(), sanitize_file_name(file_name));
        let dest = self.dir.join(&stored_name);
        tokio::fs::copy(staged, &dest).await?;

        Ok(format!(
            "{}/media/{}",
            self.public_base_url.trim_end_matches('/'),
            stored_name
        ))
    }
}

/// Keep only path-safe characters from a client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("curs 1/seminar.pdf"), "curs_1_seminar.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn test_disk_store_roundtrip() {
        let staging = tempfile::tempdir().unwrap();
        let media_dir = tempfile::tempdir().unwrap();

        let staged = staging.path().join("staged.txt");
        tokio::fs::write(&staged, b"seminar notes").await.unwrap();

        let store = DiskMediaStore::new(media_dir.path(), "http://localhost:3001/".to_string());
        let url = store
            .store("notes.txt", "text/plain", &staged)
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:3001/media/"));
        assert!(url.ends_with("notes.txt"));

        // The copied file exists and carries the staged bytes.
        let stored_name = url.rsplit('/').next().unwrap();
        let copied = tokio::fs::read(media_dir.path().join(stored_name)).await.unwrap();
        assert_eq!(copied, b"seminar notes");
    }
}
