//! Upload safety validation for attachments.
//!
//! Two layers run before anything is forwarded to the media host:
//! 1. Extension blocklist for executables and macro-enabled documents
//! 2. Magic byte detection, with a mismatch guard for claimed binary types

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Magic byte signatures for executable files.
pub const MAGIC_SIGNATURES: &[(&str, &[u8])] = &[
    ("Windows PE/MZ", &[0x4D, 0x5A]),
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),
    ("Java Class / Mach-O Fat", &[0xCA, 0xFE, 0xBA, 0xBE]),
    ("WebAssembly", &[0x00, 0x61, 0x73, 0x6D]),
];

/// Blocked file extensions (case-insensitive).
static BLOCKED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Windows executables
        "exe", "dll", "scr", "pif", "com", "msi",
        // Unix binaries
        "so", "dylib", "out",
        // JVM
        "jar", "war", "class",
        // Packages
        "deb", "rpm", "apk", "dmg", "pkg",
        // Office macros
        "xlsm", "docm", "pptm",
        // Other dangerous
        "reg", "scf", "lnk", "hta",
    ]
    .into_iter()
    .collect()
});

/// Result of upload validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
}

impl ValidationResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            block_reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
        }
    }
}

/// Validate an upload before it is staged and forwarded.
pub fn validate_upload(filename: &str, data: &[u8], max_size_bytes: u64) -> ValidationResult {
    if data.len() as u64 > max_size_bytes {
        return ValidationResult::blocked(format!(
            "File exceeds maximum size of {} bytes",
            max_size_bytes
        ));
    }

    if let Some(ext) = filename.rsplit('.').next() {
        if BLOCKED_EXTENSIONS.contains(ext.to_lowercase().as_str()) {
            return ValidationResult::blocked(format!("File extension .{} is not allowed", ext));
        }
    }

    for (name, magic) in MAGIC_SIGNATURES {
        if data.len() >= magic.len() && &data[..magic.len()] == *magic {
            return ValidationResult::blocked(format!("Executable file detected: {}", name));
        }
    }

    ValidationResult::allowed()
}

/// Detect the content type from file magic bytes, falling back to the
/// claimed type for text-like formats that legitimately lack magic bytes.
/// A claimed binary type with unrecognizable bytes is downgraded to
/// application/octet-stream.
pub fn detect_content_type(data: &[u8], claimed: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if claimed.starts_with("image/")
        || claimed.starts_with("audio/")
        || claimed.starts_with("video/")
        || claimed == "application/pdf"
        || claimed == "application/zip"
    {
        return "application/octet-stream".to_string();
    }

    claimed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_extension() {
        let result = validate_upload("payload.ExE", b"harmless bytes", 1024);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains(".ExE"));
    }

    #[test]
    fn test_elf_magic_blocked() {
        let result = validate_upload("notes.pdf", &[0x7F, 0x45, 0x4C, 0x46, 0x02], 1024);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains("ELF"));
    }

    #[test]
    fn test_oversized_blocked() {
        let result = validate_upload("big.txt", &[0u8; 32], 16);
        assert!(!result.allowed);
    }

    #[test]
    fn test_plain_text_allowed() {
        let result = validate_upload("seminar.txt", b"curs de contabilitate", 1024);
        assert!(result.allowed);
        assert!(result.block_reason.is_none());
    }

    #[test]
    fn test_detect_content_type_downgrades_fake_image() {
        // Claimed image with no recognizable magic bytes
        let mime = detect_content_type(b"not really a png", "image/png");
        assert_eq!(mime, "application/octet-stream");
    }

    #[test]
    fn test_detect_content_type_trusts_text() {
        let mime = detect_content_type(b"plain text", "text/plain");
        assert_eq!(mime, "text/plain");
    }

    #[test]
    fn test_detect_content_type_real_png() {
        let png_header: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
        ];
        let mime = detect_content_type(png_header, "application/octet-stream");
        assert_eq!(mime, "image/png");
    }
}
