use opentelemetry::{
    global,
    trace::{TraceContextExt, TraceError},
    KeyValue,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{self, RandomIdGenerator, Sampler, Tracer},
    Resource,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use tracing_opentelemetry::{OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to initialize OpenTelemetry: {0}")]
    OpenTelemetryInit(#[from] TraceError),
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Install the global subscriber.
///
/// Logs go to stdout, as JSON when `enable_json_logging` is set. Spans are
/// exported over OTLP only when an endpoint is configured. `RUST_LOG`
/// overrides `log_level`.
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    let tracer = match config.otlp_endpoint.as_deref() {
        Some(endpoint) if !endpoint.trim().is_empty() => Some(otlp_tracer(config, endpoint)?),
        _ => None,
    };
    let exporting = tracer.is_some();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let json_layer = config.enable_json_logging.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_target(false)
    });
    let text_layer = (!config.enable_json_logging)
        .then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracer.map(OpenTelemetryLayer::new))
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;

    info!(
        service = %config.service_name,
        version = %config.service_version,
        otlp = exporting,
        "Observability initialized"
    );
    Ok(())
}

fn default_directives(level: &str) -> String {
    format!(
        "restaurant_rs={level},menu_service={level},order_service={level},tower_http={level},sqlx=warn",
        level = level
    )
}

fn otlp_tracer(config: &ObservabilityConfig, endpoint: &str) -> Result<Tracer, ObservabilityError> {
    let resource = Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("service.namespace", "restaurant"),
    ]);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            trace::config()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .with_batch_config(
            trace::BatchConfig::default()
                .with_max_queue_size(2048)
                .with_scheduled_delay(Duration::from_millis(500)),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    Ok(tracer)
}

/// Trace ID of the active span, if it carries a valid OpenTelemetry context
pub fn get_current_trace_id() -> Option<String> {
    let context = tracing::Span::current().context();
    let span_context = context.span().span_context().clone();

    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}

/// Emit an event at `$level`, tagged with the current trace ID when there is one
#[doc(hidden)]
#[macro_export]
macro_rules! event_with_trace {
    ($level:expr, $($arg:tt)*) => {
        match $crate::observability::tracing::get_current_trace_id() {
            Some(trace_id) => tracing::event!($level, trace_id = %trace_id, $($arg)*),
            None => tracing::event!($level, $($arg)*),
        }
    };
}

#[macro_export]
macro_rules! info_with_trace {
    ($($arg:tt)*) => { $crate::event_with_trace!(tracing::Level::INFO, $($arg)*) };
}

#[macro_export]
macro_rules! warn_with_trace {
    ($($arg:tt)*) => { $crate::event_with_trace!(tracing::Level::WARN, $($arg)*) };
}

#[macro_export]
macro_rules! error_with_trace {
    ($($arg:tt)*) => { $crate::event_with_trace!(tracing::Level::ERROR, $($arg)*) };
}

/// Flush and stop the tracer provider, giving up after a few seconds
pub async fn shutdown_observability() {
    info!("Shutting down observability");

    // The global provider blocks while flushing
    let flush = tokio::task::spawn_blocking(global::shutdown_tracer_provider);

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, flush).await {
        Ok(Ok(())) => info!("Observability shutdown completed"),
        Ok(Err(e)) => warn!(error = %e, "Observability shutdown task failed"),
        Err(_) => warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Observability shutdown timed out"
        ),
    }
}
