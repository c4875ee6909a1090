//! CORS response headers
//!
//! The allow/deny decision lives in [`crate::origin`]; this module only
//! writes the headers browsers expect for an allowed origin.

use crate::origin::OriginDecision;
use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS,
    VARY,
};
use hyper::{Response, StatusCode};

pub const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Add `Access-Control-Allow-*` headers for an allowed browser origin
pub fn apply(headers: &mut HeaderMap, decision: &OriginDecision) {
    let OriginDecision::Allowed(origin) = decision else {
        return;
    };
    let Ok(origin) = HeaderValue::from_str(origin) else {
        return;
    };

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

/// Answer a preflight `OPTIONS` request
pub fn preflight(request_headers: &HeaderMap, decision: &OriginDecision) -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    apply(headers, decision);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    if let Some(requested) = request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        headers.append(
            VARY,
            HeaderValue::from_static("Access-Control-Request-Headers"),
        );
    }

    response
}
