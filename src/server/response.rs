//! Response shaping
//!
//! Every outcome leaves the relay as a JSON envelope. Failures share one
//! shape, `{success:false, error, details?}`, where `details` carries the
//! upstream body and is only present in development mode.

use crate::config::Environment;
use crate::error::RelayError;
use crate::relay::RelayedFile;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// `POST /upload` success body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_id: String,
    pub filename: String,
}

impl From<RelayedFile> for UploadResponse {
    fn from(file: RelayedFile) -> Self {
        Self {
            success: true,
            url: file.url,
            file_id: file.file_id,
            filename: file.filename,
        }
    }
}

/// Failure body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    /// Build the client-facing envelope for a relay error
    pub fn from_error(err: &RelayError, environment: Environment) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            details: environment
                .is_development()
                .then(|| err.details().cloned())
                .flatten(),
        }
    }
}

/// `GET /health` body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub shop: String,
    pub api_version: String,
}

/// Serialize `body` as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<String> {
    let (status, body) = match serde_json::to_string(body) {
        Ok(json) => (status, json),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!(
                r#"{{"success":false,"error":"Failed to serialize response: {}"}}"#,
                e.to_string().replace('"', "'")
            ),
        ),
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}

/// Error envelope with the error's status code
pub fn error_response(err: &RelayError, environment: Environment) -> Response<String> {
    json_response(
        err.status_code(),
        &ErrorResponse::from_error(err, environment),
    )
}

pub fn not_found() -> Response<String> {
    json_response(StatusCode::NOT_FOUND, &ErrorResponse::new("Not Found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::shopify::FileKind;
    use serde_json::json;

    fn upstream_error() -> RelayError {
        RelayError::UpstreamTransport {
            message: "Upload failed with status 403: denied".into(),
            status: Some(403),
            body: Some(json!({"code": "AccessDenied"})),
        }
    }

    #[test]
    fn test_success_envelope_is_camel_case() {
        let body = UploadResponse::from(RelayedFile {
            file_id: "gid://shopify/GenericFile/9".into(),
            url: "https://cdn.shopify.com/s/files/a.pdf".into(),
            filename: "a.pdf".into(),
            kind: FileKind::Generic,
        });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "success": true,
                "url": "https://cdn.shopify.com/s/files/a.pdf",
                "fileId": "gid://shopify/GenericFile/9",
                "filename": "a.pdf"
            })
        );
    }

    #[test]
    fn test_details_hidden_in_production() {
        let body = ErrorResponse::from_error(&upstream_error(), Environment::Production);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": false, "error": "Upload failed with status 403: denied"})
        );
    }

    #[test]
    fn test_details_shown_in_development() {
        let body = ErrorResponse::from_error(&upstream_error(), Environment::Development);
        assert_eq!(body.details, Some(json!({"code": "AccessDenied"})));
    }

    #[test]
    fn test_error_response_status() {
        let response = error_response(
            &RelayError::from(ValidationError::NoFile),
            Environment::Production,
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(
            response.body(),
            r#"{"success":false,"error":"No file uploaded"}"#
        );
    }

    #[test]
    fn test_health_envelope() {
        let body = HealthResponse {
            status: "ok",
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            shop: "example.myshopify.com".into(),
            api_version: "2025-10".into(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["apiVersion"], "2025-10");
        assert_eq!(value["shop"], "example.myshopify.com");
    }
}
