use axum::{
    extract::{MatchedPath, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::{Status, TraceContextExt};
use sqlx::PgPool;
use std::{future::Future, sync::Arc, time::Instant};
use tracing::{error, field, info, instrument, warn, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

/// Keeps the in-flight gauge honest even when the request future is dropped
struct InFlight {
    metrics: Arc<Metrics>,
    method: String,
    route: String,
}

impl InFlight {
    fn enter(metrics: Arc<Metrics>, method: &str, route: &str) -> Self {
        metrics.increment_in_flight(method, route);
        Self {
            metrics,
            method: method.to_string(),
            route: route.to_string(),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.metrics.decrement_in_flight(&self.method, &self.route);
    }
}

/// First hop of `x-forwarded-for`, then `x-real-ip`
fn client_address(headers: &HeaderMap) -> String {
    let header = move |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    header("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .or_else(|| header("x-real-ip"))
        .map(str::trim)
        .unwrap_or("unknown")
        .to_string()
}

const UNMATCHED_ROUTE: &str = "unmatched";

/// Route template such as `/order/:id`. Paths no route matched share one label.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

fn current_trace_id() -> String {
    Span::current()
        .context()
        .span()
        .span_context()
        .trace_id()
        .to_string()
}

/// Server span, request metrics and access log for every request
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = route_label(&request);
    let client = client_address(request.headers());
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span_name = format!("{} {}", method, route);
    let span = tracing::info_span!(
        target: "restaurant_rs::http",
        "{}", span_name,
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %route,
        http.url = %request.uri(),
        http.user_agent = %user_agent,
        client.address = %client,
        http.response.status_code = field::Empty,
        http.response_time_ms = field::Empty,
    );

    async move {
        let _in_flight = InFlight::enter(metrics.clone(), &method, &route);
        let trace_id = current_trace_id();
        info!(trace_id = %trace_id, method = %method, path = %route, client_ip = %client, "Processing request");

        let response = next.run(request).await;

        let elapsed = started.elapsed();
        let status = response.status();
        let span = Span::current();
        span.record("http.response.status_code", status.as_u16());
        span.record("http.response_time_ms", elapsed.as_millis());
        span.context().span().set_status(if status.is_server_error() {
            Status::error("HTTP server error")
        } else {
            Status::Ok
        });

        metrics.record_http_request(&method, &route, status.as_u16(), elapsed.as_secs_f64());

        let duration_ms = elapsed.as_millis();
        if status.is_server_error() {
            error!(trace_id = %trace_id, path = %route, status_code = status.as_u16(), duration_ms, "Request failed");
        } else if status.is_client_error() {
            warn!(trace_id = %trace_id, path = %route, status_code = status.as_u16(), duration_ms, "Request rejected");
        } else {
            info!(trace_id = %trace_id, path = %route, status_code = status.as_u16(), duration_ms, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}

/// Wraps repository calls in a client span and records their outcome.
///
/// With a pool attached, the busy-connection gauge is resampled after every call.
#[derive(Clone)]
pub struct DatabaseTracingMiddleware {
    metrics: Arc<Metrics>,
    pool: Option<PgPool>,
}

impl DatabaseTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    fn sample_pool(&self) {
        if let Some(pool) = &self.pool {
            let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX);
            let busy = pool.size().saturating_sub(idle);
            self.metrics.set_active_connections(f64::from(busy));
        }
    }

    #[instrument(skip_all, fields(
        otel.kind = "client",
        db.system = "postgresql",
        db.operation = %operation,
        db.sql.table = %table,
    ))]
    pub async fn trace_operation<F, T, E>(
        &self,
        operation: &str,
        table: &str,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let result = future.await;
        let elapsed = started.elapsed();

        self.metrics
            .record_database_operation(operation, table, result.is_ok(), elapsed.as_secs_f64());
        self.sample_pool();

        match &result {
            Ok(_) => tracing::debug!(duration_ms = elapsed.as_millis(), "Query finished"),
            Err(e) => error!(error = %e, duration_ms = elapsed.as_millis(), "Query failed"),
        }
        result
    }
}
