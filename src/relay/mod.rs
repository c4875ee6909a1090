//! Upload orchestrator
//!
//! Drives one upload through the fixed protocol:
//!
//! ```text
//! Validating -> StagingRequested -> BytesUploaded -> FileRegistered
//!      \               \                  \                \
//!       +---------------+------------------+----------------+--> Failed
//! ```
//!
//! Each step consumes the previous step's output, so the calls are strictly
//! sequential. Nothing is retried and nothing is rolled back: a staged target
//! that is never registered is left for Shopify to expire.

use crate::error::RelayError;
use crate::metrics;
use crate::shopify::{
    CommercePlatform, FileCreateInput, FileKind, StagedUploadInput, RESOURCE_FILE,
};
use crate::upload::{IncomingUpload, UploadPolicy};
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::field::Empty;
use tracing::{debug, error, info};

/// Protocol stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    /// Declared metadata checked against the upload policy
    Validating,
    /// `stagedUploadsCreate` issued
    StagingRequested,
    /// File bytes sent to the staging target
    BytesUploaded,
    /// `fileCreate` issued
    FileRegistered,
}

impl RelayStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayStage::Validating => "validating",
            RelayStage::StagingRequested => "staging_requested",
            RelayStage::BytesUploaded => "bytes_uploaded",
            RelayStage::FileRegistered => "file_registered",
        }
    }
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure, tagged with the stage that was executing
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RelayFailure {
    pub stage: RelayStage,
    #[source]
    pub error: RelayError,
}

impl RelayFailure {
    fn at(stage: RelayStage, error: impl Into<RelayError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

/// Successful relay result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedFile {
    pub file_id: String,
    pub url: String,
    pub filename: String,
    pub kind: FileKind,
}

/// Upload orchestrator over a [`CommercePlatform`]
pub struct UploadRelay<P> {
    platform: P,
    policy: UploadPolicy,
}

impl<P: CommercePlatform> UploadRelay<P> {
    pub fn new(platform: P, policy: UploadPolicy) -> Self {
        Self { platform, policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Relay one upload to Shopify
    #[tracing::instrument(
        name = "relay.upload",
        skip(self, upload),
        fields(
            upload.filename = %upload.filename,
            upload.mime_type = %upload.mime_type,
            upload.bytes = upload.size(),
            relay.stage = Empty
        )
    )]
    pub async fn relay(&self, upload: IncomingUpload) -> Result<RelayedFile, RelayFailure> {
        let start = Instant::now();
        let result = self.run(&upload).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(file) => {
                metrics::record_upload_success(upload.size(), elapsed.as_secs_f64());
                info!(
                    url = %file.url,
                    file_id = %file.file_id,
                    duration_ms = elapsed.as_millis() as u64,
                    "Upload relayed"
                );
            }
            Err(failure) => {
                metrics::record_upload_failure(
                    failure.stage.as_str(),
                    failure.error.kind(),
                    elapsed.as_secs_f64(),
                );
                error!(
                    stage = %failure.stage,
                    kind = failure.error.kind(),
                    error = %failure.error,
                    details = ?failure.error.details(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Upload relay failed"
                );
            }
        }

        result
    }

    async fn run(&self, upload: &IncomingUpload) -> Result<RelayedFile, RelayFailure> {
        let mut stage = RelayStage::Validating;
        enter(stage);
        self.policy
            .validate(upload)
            .map_err(|e| RelayFailure::at(stage, e))?;

        stage = RelayStage::StagingRequested;
        enter(stage);
        let staged_input = StagedUploadInput {
            filename: upload.filename.clone(),
            mime_type: upload.mime_type.clone(),
            resource: RESOURCE_FILE,
            file_size: upload.size(),
        };
        let target = self
            .platform
            .create_staged_upload(&staged_input)
            .await
            .map_err(|e| RelayFailure::at(stage, e))?;

        stage = RelayStage::BytesUploaded;
        enter(stage);
        self.platform
            .upload_to_target(&target, upload)
            .await
            .map_err(|e| RelayFailure::at(stage, e))?;

        stage = RelayStage::FileRegistered;
        enter(stage);
        let file_input = FileCreateInput {
            alt: upload.filename.clone(),
            content_type: RESOURCE_FILE,
            original_source: target.resource_url,
        };
        let created = self
            .platform
            .create_file(&file_input)
            .await
            .map_err(|e| RelayFailure::at(stage, e))?;

        Ok(RelayedFile {
            file_id: created.id().to_string(),
            url: created.url().to_string(),
            filename: upload.filename.clone(),
            kind: created.kind(),
        })
    }
}

fn enter(stage: RelayStage) {
    tracing::Span::current().record("relay.stage", stage.as_str());
    debug!(stage = %stage, "Relay stage");
}
