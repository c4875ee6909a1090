//! Upload module
//!
//! The request-scoped upload entity, the declared-metadata filter applied
//! before any outbound call, and the inbound multipart parser.

use bytes::Bytes;

pub mod multipart;
pub mod validate;

pub use validate::UploadPolicy;

/// Name of the multipart field carrying the file
pub const FILE_FIELD: &str = "file";

/// Media type assumed when the client omits one on the file part
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file received from a client
///
/// Held entirely in memory for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct IncomingUpload {
    pub filename: String,
    /// Media type declared by the client, not sniffed from the content
    pub mime_type: String,
    pub data: Bytes,
}

impl IncomingUpload {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_upload_size() {
        let upload = IncomingUpload::new("cover.png", "image/png", Bytes::from(vec![0u8; 1024]));
        assert_eq!(upload.size(), 1024);
        assert_eq!(upload.filename, "cover.png");
    }
}
