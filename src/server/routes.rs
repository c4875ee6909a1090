//! Request routing and handlers

use super::response::{self, HealthResponse, UploadResponse};
use super::{cors, AppState};
use crate::error::RelayError;
use crate::metrics;
use crate::origin::OriginDecision;
use crate::relay::RelayStage;
use crate::upload::multipart;
use chrono::{SecondsFormat, Utc};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, ORIGIN};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Entry point for every request
pub(super) async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<String>, Infallible> {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "http.request",
        http.method = %req.method(),
        http.target = %req.uri().path(),
        http.status_code = tracing::field::Empty,
        request_id = %request_id,
    );

    async move {
        let origin = req
            .headers()
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let decision = state.origins.check(origin.as_deref());

        let mut response = match &decision {
            OriginDecision::Rejected(origin) => {
                metrics::record_origin_rejection();
                warn!(origin = %origin, "CORS blocked origin");
                response::error_response(
                    &RelayError::OriginRejected(origin.clone()),
                    state.config.environment,
                )
            }
            _ => route(req, &state, &decision).await,
        };

        cors::apply(response.headers_mut(), &decision);
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        tracing::Span::current().record("http.status_code", response.status().as_u16());
        Ok(response)
    }
    .instrument(span)
    .await
}

async fn route(
    req: Request<Incoming>,
    state: &AppState,
    decision: &OriginDecision,
) -> Response<String> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => cors::preflight(req.headers(), decision),
        (&Method::GET, "/health") => health(state),
        (&Method::POST, "/upload") => upload(req, state).await,
        _ => response::not_found(),
    }
}

fn health(state: &AppState) -> Response<String> {
    response::json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            shop: state.config.shop.domain.clone(),
            api_version: state.config.shop.api_version.clone(),
        },
    )
}

async fn upload(req: Request<Incoming>, state: &AppState) -> Response<String> {
    let environment = state.config.environment;
    let max_file_size = state.relay.policy().max_file_size;

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let parsed = match multipart::boundary(content_type.as_deref()) {
        Ok(boundary) => {
            let stream = req.into_body().into_data_stream();
            multipart::read_upload(stream, boundary, max_file_size).await
        }
        Err(e) => Err(e),
    };

    let upload = match parsed {
        Ok(upload) => upload,
        Err(e) => {
            let err = RelayError::from(e);
            metrics::record_upload_failure(RelayStage::Validating.as_str(), err.kind(), 0.0);
            warn!(error = %err, "Rejected upload request");
            return response::error_response(&err, environment);
        }
    };

    info!(
        filename = %upload.filename,
        mime_type = %upload.mime_type,
        size = upload.size(),
        "Upload request received"
    );

    match state.relay.relay(upload).await {
        Ok(file) => response::json_response(StatusCode::OK, &UploadResponse::from(file)),
        Err(failure) => response::error_response(&failure.error, environment),
    }
}
