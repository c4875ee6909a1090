//! Relay error taxonomy
//!
//! Every failure the relay can produce funnels into [`RelayError`], which
//! knows its HTTP status and the optional upstream payload that may be
//! echoed to clients in development mode.

use hyper::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Rejections raised before any outbound call is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Invalid file type. Only images and design files are allowed.")]
    UnsupportedType { mime_type: String, filename: String },

    #[error("File too large. Maximum size is {}MB.", .max / (1024 * 1024))]
    TooLarge { size: u64, max: u64 },

    #[error("Malformed upload: {0}")]
    Malformed(String),
}

/// Relay errors
#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not allowed by CORS")]
    OriginRejected(String),

    /// Network failure or non-2xx status from Shopify or the staging target
    #[error("{message}")]
    UpstreamTransport {
        message: String,
        status: Option<u16>,
        body: Option<Value>,
    },

    /// GraphQL `errors` or mutation `userErrors`
    #[error("{message}")]
    UpstreamDomain { message: String, payload: Value },

    /// An expected field was missing from an upstream response
    #[error("{message}")]
    ResponseShape {
        message: String,
        body: Option<Value>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn shape(message: impl Into<String>) -> Self {
        RelayError::ResponseShape {
            message: message.into(),
            body: None,
        }
    }

    /// HTTP status reported to the client
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::OriginRejected(_) => StatusCode::FORBIDDEN,
            RelayError::UpstreamTransport { .. }
            | RelayError::UpstreamDomain { .. }
            | RelayError::ResponseShape { .. }
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Upstream payload captured for diagnostics
    pub fn details(&self) -> Option<&Value> {
        match self {
            RelayError::UpstreamTransport { body, .. } => body.as_ref(),
            RelayError::UpstreamDomain { payload, .. } => Some(payload),
            RelayError::ResponseShape { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Validation(ValidationError::TooLarge { .. }) => "upload_size_exceeded",
            RelayError::Validation(_) => "validation",
            RelayError::OriginRejected(_) => "cors_rejection",
            RelayError::UpstreamTransport { .. } => "upstream_transport",
            RelayError::UpstreamDomain { .. } => "upstream_domain",
            RelayError::ResponseShape { .. } => "response_shape",
            RelayError::Internal(_) => "internal",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Parse an upstream body as JSON, falling back to the raw text
pub(crate) fn body_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_errors_are_400() {
        let err: RelayError = ValidationError::NoFile.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No file uploaded");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_too_large_message() {
        let err = ValidationError::TooLarge {
            size: 25 * 1024 * 1024,
            max: 20 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File too large. Maximum size is 20MB.");
        assert_eq!(RelayError::from(err).kind(), "upload_size_exceeded");
    }

    #[test]
    fn test_upstream_errors_are_500() {
        let err = RelayError::UpstreamDomain {
            message: "Staged upload errors: boom".into(),
            payload: json!([{"message": "boom"}]),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details(), Some(&json!([{"message": "boom"}])));

        let err = RelayError::shape("Could not extract file URL from response");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().is_none());
    }

    #[test]
    fn test_origin_rejection_is_403() {
        let err = RelayError::OriginRejected("https://evil.example".into());
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Not allowed by CORS");
    }

    #[test]
    fn test_body_value_falls_back_to_string() {
        assert_eq!(body_value(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(body_value("<Error/>"), json!("<Error/>"));
    }
}
