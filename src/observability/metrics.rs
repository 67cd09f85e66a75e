use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

const REQUEST_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

fn counter(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<CounterVec, MetricsError> {
    let counter = CounterVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn histogram(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<HistogramVec, MetricsError> {
    let opts = HistogramOpts::new(name, help).buckets(REQUEST_BUCKETS.to_vec());
    let histogram = HistogramVec::new(opts, labels)?;
    registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}

/// Prometheus registry of one service process.
///
/// Both binaries register the same families; the dish or order counters
/// simply stay empty in the service that does not own them.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    http_requests_total: CounterVec,
    http_request_duration_seconds: HistogramVec,
    http_requests_in_flight: GaugeVec,

    database_operations_total: CounterVec,
    database_operation_duration_seconds: HistogramVec,
    database_connections_active: Gauge,

    dish_operations_total: CounterVec,
    order_operations_total: CounterVec,

    menu_client_requests_total: CounterVec,
    menu_client_request_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        let database_connections_active = Gauge::new(
            "database_connections_active",
            "Number of database pool connections currently checked out",
        )?;
        registry.register(Box::new(database_connections_active.clone()))?;

        let metrics = Metrics {
            http_requests_total: counter(
                &registry,
                "http_requests_total",
                "Total number of HTTP requests processed",
                &["method", "endpoint", "status_code"],
            )?,
            http_request_duration_seconds: histogram(
                &registry,
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "endpoint"],
            )?,
            http_requests_in_flight,
            database_operations_total: counter(
                &registry,
                "database_operations_total",
                "Total number of database operations",
                &["operation", "table", "status"],
            )?,
            database_operation_duration_seconds: histogram(
                &registry,
                "database_operation_duration_seconds",
                "Database operation duration in seconds",
                &["operation", "table"],
            )?,
            database_connections_active,
            dish_operations_total: counter(
                &registry,
                "dish_operations_total",
                "Total number of dish catalog operations",
                &["operation", "status"],
            )?,
            order_operations_total: counter(
                &registry,
                "order_operations_total",
                "Total number of order operations",
                &["operation", "status"],
            )?,
            menu_client_requests_total: counter(
                &registry,
                "menu_client_requests_total",
                "Total number of calls made to the menu service",
                &["outcome"],
            )?,
            menu_client_request_duration_seconds: histogram(
                &registry,
                "menu_client_request_duration_seconds",
                "Duration of calls made to the menu service in seconds",
                &["outcome"],
            )?,
            registry,
        };

        debug!("Prometheus metrics registered");
        Ok(metrics)
    }

    /// Prometheus text exposition of every registered family
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_code = status_code.to_string();
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_code])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    pub fn record_database_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_seconds: f64,
    ) {
        self.database_operations_total
            .with_label_values(&[operation, table, outcome(success)])
            .inc();
        self.database_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_seconds);
    }

    pub fn record_dish_operation(&self, operation: &str, success: bool) {
        self.dish_operations_total
            .with_label_values(&[operation, outcome(success)])
            .inc();
    }

    pub fn record_order_operation(&self, operation: &str, success: bool) {
        self.order_operations_total
            .with_label_values(&[operation, outcome(success)])
            .inc();
    }

    /// `outcome` is "success" or the kind of client error
    pub fn record_menu_client_request(&self, outcome: &str, duration_seconds: f64) {
        self.menu_client_requests_total
            .with_label_values(&[outcome])
            .inc();
        self.menu_client_request_duration_seconds
            .with_label_values(&[outcome])
            .observe(duration_seconds);
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }

    pub fn set_active_connections(&self, count: f64) {
        self.database_connections_active.set(count);
    }
}
