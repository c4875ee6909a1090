//! Shopify platform client
//!
//! Talks to the Shopify Admin GraphQL API and to the storage targets it
//! hands out.
//!
//! # Operations
//!
//! | Operation | Span Name | Target |
//! |-----------|-----------|--------|
//! | stagedUploadsCreate | `shopify.staged_uploads_create` | GraphQL endpoint |
//! | Direct upload | `shopify.upload_to_target` | Signed staging URL |
//! | fileCreate | `shopify.file_create` | GraphQL endpoint |
//!
//! GraphQL calls are authenticated with the `X-Shopify-Access-Token` header.
//! The direct upload is not: its authorization lives in the signed form
//! fields returned by `stagedUploadsCreate`.

pub mod types;

use crate::config::ShopConfig;
use crate::error::{body_value, RelayError};
use crate::metrics;
use crate::upload::{IncomingUpload, FILE_FIELD};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::field::Empty;

pub use types::{
    CreatedFile, FileCreateInput, FileKind, StagedParameter, StagedTarget, StagedUploadInput,
    UserError, RESOURCE_FILE,
};
use types::{
    FileCreateData, FileCreateVariables, GraphQlRequest, GraphQlResponse, StagedUploadsCreateData,
    StagedUploadsCreateVariables, FILE_CREATE, STAGED_UPLOADS_CREATE,
};

/// Header carrying the Admin API access token
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// The three outbound calls of the relay protocol
///
/// Implemented by [`ShopifyClient`]; mocked in orchestrator tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommercePlatform: Send + Sync {
    /// Request one staged upload slot
    async fn create_staged_upload(
        &self,
        input: &StagedUploadInput,
    ) -> Result<StagedTarget, RelayError>;

    /// Send the file to the staging URL with the target's form fields
    async fn upload_to_target(
        &self,
        target: &StagedTarget,
        upload: &IncomingUpload,
    ) -> Result<(), RelayError>;

    /// Register the staged resource as a permanent file
    async fn create_file(&self, input: &FileCreateInput) -> Result<CreatedFile, RelayError>;
}

/// Shopify Admin API client
pub struct ShopifyClient {
    access_token: String,
    graphql_url: String,
    http_client: reqwest::Client,
}

impl ShopifyClient {
    /// Create a new client
    pub fn new(config: &ShopConfig) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            access_token: config.access_token.clone(),
            graphql_url: config.graphql_endpoint(),
            http_client,
        })
    }

    /// GraphQL endpoint this client posts to
    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// Execute a GraphQL operation and unwrap its `data`
    ///
    /// A non-empty top-level `errors` list fails with the list captured
    /// verbatim, prefixed by `failure`.
    async fn execute<V, T>(
        &self,
        call: &'static str,
        query: &str,
        variables: V,
        failure: &'static str,
    ) -> Result<T, RelayError>
    where
        V: Serialize + Send + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(&self.graphql_url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream_request(call, "error");
                RelayError::UpstreamTransport {
                    message: format!("{}: {}", failure, e),
                    status: None,
                    body: None,
                }
            })?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());
        metrics::record_upstream_request(call, status.as_str());

        let text = response.text().await.map_err(|e| RelayError::UpstreamTransport {
            message: format!("{}: failed to read response: {}", failure, e),
            status: Some(status.as_u16()),
            body: None,
        })?;

        if !status.is_success() {
            return Err(RelayError::UpstreamTransport {
                message: format!("{}: request failed with status {}", failure, status.as_u16()),
                status: Some(status.as_u16()),
                body: Some(body_value(&text)),
            });
        }

        let envelope: GraphQlResponse<T> =
            serde_json::from_str(&text).map_err(|e| RelayError::ResponseShape {
                message: format!("{}: unexpected response: {}", failure, e),
                body: Some(body_value(&text)),
            })?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let payload = Value::Array(errors);
            return Err(RelayError::UpstreamDomain {
                message: format!("{}: {}", failure, payload),
                payload,
            });
        }

        envelope.data.ok_or_else(|| RelayError::ResponseShape {
            message: format!("{}: response contained no data", failure),
            body: Some(body_value(&text)),
        })
    }
}

#[async_trait]
impl CommercePlatform for ShopifyClient {
    #[tracing::instrument(
        name = "shopify.staged_uploads_create",
        skip(self, input),
        fields(
            shopify.operation = "stagedUploadsCreate",
            upload.filename = %input.filename,
            upload.mime_type = %input.mime_type,
            upload.bytes = input.file_size,
            http.status_code = Empty,
            shopify.resource_url = Empty
        ),
        err
    )]
    async fn create_staged_upload(
        &self,
        input: &StagedUploadInput,
    ) -> Result<StagedTarget, RelayError> {
        let data: StagedUploadsCreateData = self
            .execute(
                "staged_uploads_create",
                STAGED_UPLOADS_CREATE,
                StagedUploadsCreateVariables { input: [input] },
                "Failed to create staged upload",
            )
            .await?;

        let payload = data
            .staged_uploads_create
            .ok_or_else(|| RelayError::shape("stagedUploadsCreate returned no payload"))?;

        check_user_errors(&payload.user_errors, "Staged upload errors")?;

        let target = exactly_one(payload.staged_targets, "staged target")?;
        tracing::Span::current().record("shopify.resource_url", target.resource_url.as_str());
        tracing::info!(url = %target.url, "Staged upload created");

        Ok(target)
    }

    #[tracing::instrument(
        name = "shopify.upload_to_target",
        skip(self, target, upload),
        fields(
            shopify.operation = "stagedUpload",
            upload.filename = %upload.filename,
            upload.bytes = upload.size(),
            staging.fields = target.parameters.len(),
            http.status_code = Empty
        ),
        err
    )]
    async fn upload_to_target(
        &self,
        target: &StagedTarget,
        upload: &IncomingUpload,
    ) -> Result<(), RelayError> {
        let form = staging_form(target, upload)?;

        let response = self
            .http_client
            .post(&target.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream_request("upload_to_target", "error");
                RelayError::UpstreamTransport {
                    message: format!("Upload to staging target failed: {}", e),
                    status: None,
                    body: None,
                }
            })?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());
        metrics::record_upstream_request("upload_to_target", status.as_str());

        if status.is_success() {
            tracing::info!("File uploaded to staging target");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(RelayError::UpstreamTransport {
            message: format!("Upload failed with status {}: {}", status.as_u16(), text),
            status: Some(status.as_u16()),
            body: Some(body_value(&text)),
        })
    }

    #[tracing::instrument(
        name = "shopify.file_create",
        skip(self, input),
        fields(
            shopify.operation = "fileCreate",
            shopify.resource_url = %input.original_source,
            http.status_code = Empty,
            shopify.file_id = Empty
        ),
        err
    )]
    async fn create_file(&self, input: &FileCreateInput) -> Result<CreatedFile, RelayError> {
        let data: FileCreateData = self
            .execute(
                "file_create",
                FILE_CREATE,
                FileCreateVariables { files: [input] },
                "Failed to create file",
            )
            .await?;

        let payload = data
            .file_create
            .ok_or_else(|| RelayError::shape("fileCreate returned no payload"))?;

        check_user_errors(&payload.user_errors, "File creation errors")?;

        let node = exactly_one(payload.files, "created file")?;
        let file = CreatedFile::from_node(node)
            .ok_or_else(|| RelayError::shape("Could not extract file URL from response"))?;

        tracing::Span::current().record("shopify.file_id", file.id());
        tracing::info!(url = %file.url(), kind = ?file.kind(), "File created");

        Ok(file)
    }
}

/// Build the direct-upload form
///
/// Signed fields go first in the order Shopify returned them; the storage
/// provider validates the signature against that order. The file is last.
pub fn staging_form(
    target: &StagedTarget,
    upload: &IncomingUpload,
) -> Result<reqwest::multipart::Form, RelayError> {
    let mut form = reqwest::multipart::Form::new();
    for param in &target.parameters {
        form = form.text(param.name.clone(), param.value.clone());
    }

    let file = reqwest::multipart::Part::stream_with_length(upload.data.clone(), upload.size())
        .file_name(upload.filename.clone())
        .mime_str(&upload.mime_type)
        .map_err(|e| {
            RelayError::Internal(format!(
                "Invalid media type '{}': {}",
                upload.mime_type, e
            ))
        })?;

    Ok(form.part(FILE_FIELD, file))
}

fn check_user_errors(errors: &[UserError], prefix: &str) -> Result<(), RelayError> {
    if errors.is_empty() {
        return Ok(());
    }
    let payload = serde_json::to_value(errors).unwrap_or(Value::Null);
    Err(RelayError::UpstreamDomain {
        message: format!("{}: {}", prefix, payload),
        payload,
    })
}

/// Take the single element of a list that should hold exactly one
fn exactly_one<T>(mut items: Vec<T>, what: &str) -> Result<T, RelayError> {
    match items.len() {
        1 => items
            .pop()
            .ok_or_else(|| RelayError::shape(format!("Expected one {}", what))),
        0 => Err(RelayError::shape(format!(
            "Expected one {}, response contained none",
            what
        ))),
        n => Err(RelayError::shape(format!(
            "Expected one {}, response contained {}",
            what, n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop_config(endpoint: Option<&str>) -> ShopConfig {
        ShopConfig {
            domain: "example.myshopify.com".into(),
            access_token: "shpat_test".into(),
            api_version: "2025-10".into(),
            endpoint: endpoint.map(str::to_string),
            timeout_seconds: Some(5),
        }
    }

    #[test]
    fn test_client_graphql_url() {
        let client = ShopifyClient::new(&shop_config(None)).unwrap();
        assert_eq!(
            client.graphql_url(),
            "https://example.myshopify.com/admin/api/2025-10/graphql.json"
        );

        let client = ShopifyClient::new(&shop_config(Some("http://localhost:9000"))).unwrap();
        assert_eq!(
            client.graphql_url(),
            "http://localhost:9000/admin/api/2025-10/graphql.json"
        );
    }

    #[test]
    fn test_exactly_one() {
        assert_eq!(exactly_one(vec![7], "item").unwrap(), 7);
        assert!(matches!(
            exactly_one(Vec::<u8>::new(), "item"),
            Err(RelayError::ResponseShape { .. })
        ));
        let err = exactly_one(vec![1, 2], "staged target").unwrap_err();
        assert!(err.to_string().contains("contained 2"));
    }

    #[test]
    fn test_user_errors_captured() {
        let errors = vec![UserError {
            field: Some(vec!["input".into(), "0".into(), "fileSize".into()]),
            message: "File size is too large".into(),
        }];
        let err = check_user_errors(&errors, "Staged upload errors").unwrap_err();
        assert!(err.to_string().starts_with("Staged upload errors: "));
        assert!(err.to_string().contains("File size is too large"));
        assert!(check_user_errors(&[], "x").is_ok());
    }

    #[test]
    fn test_staging_form_rejects_invalid_mime() {
        let target = StagedTarget {
            url: "https://storage.example/upload".into(),
            resource_url: "https://storage.example/tmp/1".into(),
            parameters: vec![],
        };
        let upload = IncomingUpload::new("a.png", "not a mime", bytes::Bytes::from_static(b"x"));
        assert!(staging_form(&target, &upload).is_err());
    }
}
