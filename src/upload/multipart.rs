//! Inbound multipart parsing
//!
//! Reads the single `file` part of a `multipart/form-data` request body into
//! memory. The size limit is enforced while streaming so an oversized body is
//! abandoned as soon as it crosses the limit.

use super::{IncomingUpload, DEFAULT_MIME_TYPE, FILE_FIELD};
use crate::error::ValidationError;
use bytes::Bytes;
use futures::Stream;

/// Headroom for non-file fields and part headers on top of the file limit
const STREAM_OVERHEAD: u64 = 64 * 1024;

/// Extract the multipart boundary from a request `Content-Type`
///
/// A request that is not `multipart/form-data` carries no file.
pub fn boundary(content_type: Option<&str>) -> Result<String, ValidationError> {
    content_type
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(ValidationError::NoFile)
}

/// Read the `file` part from a multipart body
///
/// Other fields are drained and ignored. A `file` part without a filename is
/// treated as a plain text field.
pub async fn read_upload<S, O, E>(
    stream: S,
    boundary: String,
    max_file_size: u64,
) -> Result<IncomingUpload, ValidationError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let constraints = multer::Constraints::new().size_limit(
        multer::SizeLimit::new()
            .whole_stream(max_file_size.saturating_add(STREAM_OVERHEAD))
            .per_field(max_file_size),
    );
    let mut multipart = multer::Multipart::with_constraints(stream, boundary, constraints);

    let mut upload: Option<IncomingUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multer_error(e, max_file_size))?
    {
        let is_file = field.name() == Some(FILE_FIELD) && field.file_name().is_some();

        if !is_file {
            field
                .bytes()
                .await
                .map_err(|e| map_multer_error(e, max_file_size))?;
            continue;
        }

        if upload.is_some() {
            return Err(ValidationError::Malformed(
                "multiple file parts are not supported".to_string(),
            ));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| map_multer_error(e, max_file_size))?;

        upload = Some(IncomingUpload::new(filename, mime_type, data));
    }

    upload.ok_or(ValidationError::NoFile)
}

fn map_multer_error(err: multer::Error, max_file_size: u64) -> ValidationError {
    match err {
        // Parsing stops at the limit, so the real size is only known to exceed it
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            ValidationError::TooLarge {
                size: max_file_size.saturating_add(1),
                max: max_file_size,
            }
        }
        other => ValidationError::Malformed(other.to_string()),
    }
}
