use axum::{middleware, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::handlers::{
    create_menu_router, create_ops_router, create_order_router, request_timeout_middleware,
    request_validation_middleware, security_headers_middleware, OpsState,
};
use crate::observability::{observability_middleware, shutdown_observability};
use crate::services::{DishService, OrderService};

/// Router of the menu service: dish catalog plus health and metrics
pub fn create_menu_app(
    dish_service: Arc<DishService>,
    ops_state: OpsState,
    server: &ServerConfig,
) -> Router {
    let router = create_menu_router(dish_service).merge(create_ops_router(ops_state.clone()));
    with_layers(router, ops_state, server)
}

/// Router of the order service: orders, dish lookup, health and metrics
pub fn create_order_app(
    order_service: Arc<OrderService>,
    ops_state: OpsState,
    server: &ServerConfig,
) -> Router {
    let router = create_order_router(order_service).merge(create_ops_router(ops_state.clone()));
    with_layers(router, ops_state, server)
}

fn with_layers(router: Router, ops_state: OpsState, server: &ServerConfig) -> Router {
    let metrics = ops_state.metrics;
    let max_request_size = server.max_request_size;
    let request_timeout = server.request_timeout();

    // Order matters: the last layer added runs first
    router
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(move |req, next| {
            request_validation_middleware(max_request_size, req, next)
        }))
        .layer(middleware::from_fn(move |req, next| {
            request_timeout_middleware(request_timeout, req, next)
        }))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics.clone(), req, next)
        }))
}

/// Serve `app` until Ctrl-C, then flush telemetry
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to install Ctrl-C handler, running until killed");
            std::future::pending::<()>().await;
        }
    }
    shutdown_observability().await;
}
