//! Declared-metadata upload filter
//!
//! Accepts a file when its declared media type is on the allow-list or its
//! filename extension is, and its size is within the limit.
//!
//! This inspects only what the client *claims*. No content sniffing is
//! performed, so a spoofed `Content-Type` or a renamed file passes.

use super::IncomingUpload;
use crate::config::{UploadConfig, DEFAULT_MAX_FILE_SIZE};
use crate::error::ValidationError;

/// Media types accepted regardless of filename
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/gif",
    "application/pdf",
    // .ai, .eps
    "application/postscript",
];

/// Filename extensions accepted regardless of media type (case-insensitive)
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "svg", "gif", "pdf", "ai", "eps"];

/// Upload acceptance rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_size: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
        }
    }
}

impl UploadPolicy {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Check size against the limit
    pub fn check_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Check declared media type and filename
    pub fn check_type(&self, mime_type: &str, filename: &str) -> Result<(), ValidationError> {
        if is_allowed_mime(mime_type) || has_allowed_extension(filename) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedType {
                mime_type: mime_type.to_string(),
                filename: filename.to_string(),
            })
        }
    }

    /// Validate an upload. Size is checked first.
    pub fn validate(&self, upload: &IncomingUpload) -> Result<(), ValidationError> {
        self.check_size(upload.size())?;
        self.check_type(&upload.mime_type, &upload.filename)
    }
}

fn is_allowed_mime(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

fn has_allowed_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        None => false,
    }
}
