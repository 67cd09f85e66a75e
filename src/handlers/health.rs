use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::observability::Metrics;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// State of the operational endpoints shared by both services
#[derive(Clone)]
pub struct OpsState {
    pub service_name: String,
    pub service_version: String,
    pub metrics: Arc<Metrics>,
}

impl FromRef<OpsState> for Arc<Metrics> {
    fn from_ref(state: &OpsState) -> Self {
        state.metrics.clone()
    }
}

/// `/health/status` and `/metrics`
pub fn create_ops_router(state: OpsState) -> Router {
    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Liveness of the process; storage and downstream services are not probed
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<OpsState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.service_name,
        "version": state.service_version,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Prometheus text exposition of the service registry
#[instrument(name = "metrics_handler", skip(metrics))]
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    match metrics.encode() {
        Ok(text) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], text).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
