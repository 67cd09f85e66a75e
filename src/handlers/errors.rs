use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::models::{RepositoryError, ServiceError};

/// Error response returned by every handler
pub type ApiError = (StatusCode, Json<Value>);

/// Build the `{"error": message}` body shared by all failures
pub fn error_body(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

/// Map a service error to its HTTP status and error body
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let (status, message) = match &err {
        ServiceError::DishNotFound { .. } | ServiceError::OrderNotFound { .. } => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        ServiceError::InvalidStatus { .. } | ServiceError::ValidationError { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::MenuService { .. } => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        ServiceError::Repository { source } => {
            error!(error = %source, "Storage failure");
            let message = match source {
                RepositoryError::ConnectionFailed => "database connection failed",
                RepositoryError::Timeout => "database timeout",
                _ => "internal server error",
            };
            (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
        }
    };

    error_body(status, &message)
}

/// Resolve a numeric `:id` path segment, answering 400 for anything else
pub fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "Invalid id in path");
            Err(error_body(StatusCode::BAD_REQUEST, "invalid id"))
        }
    }
}

/// Map a body that could not be parsed into the expected shape to a 400
pub fn invalid_body(rejection: JsonRejection) -> ApiError {
    warn!(reason = %rejection.body_text(), "Invalid request body");
    error_body(
        StatusCode::BAD_REQUEST,
        &format!("invalid request body: {}", rejection.body_text()),
    )
}
