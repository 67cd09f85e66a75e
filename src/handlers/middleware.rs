use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tracing::warn;

use super::errors::{error_body, ApiError};

/// Rejects bodies whose declared size exceeds `max_request_size` bytes.
///
/// Content types are left to the `Json` extractor so handlers can decide
/// the order of their checks.
pub async fn request_validation_middleware(
    max_request_size: usize,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_size_limit(&request, max_request_size)?;

    Ok(next.run(request).await)
}

/// Answers 408 with an error body when the inner service takes longer than `timeout`
pub async fn request_timeout_middleware(
    timeout: Duration,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            warn!(path = %path, timeout_ms = timeout.as_millis(), "Request timed out");
            Err(error_body(StatusCode::REQUEST_TIMEOUT, "request timed out"))
        }
    }
}

/// Only the declared `Content-Length` is checked; axum's body limit covers the rest
fn enforce_size_limit(request: &Request<Body>, max_request_size: usize) -> Result<(), ApiError> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    match declared {
        Some(length) if length > max_request_size => {
            warn!(length, max_request_size, "Request body too large");
            Err(error_body(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!(
                    "Request size {} bytes exceeds maximum of {} bytes",
                    length, max_request_size
                ),
            ))
        }
        _ => Ok(()),
    }
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'"),
    );

    response
}
