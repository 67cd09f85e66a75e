use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use restaurant_rs::{
    app::{create_order_app, serve},
    clients::HttpMenuClient,
    handlers::OpsState,
    init_observability,
    repositories::{connect, PgOrderRepository, SchemaManager},
    services::OrderService,
    Config, Metrics, ServiceKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment(ServiceKind::Order)?;

    init_observability(&config.observability)?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Menu service: {}", config.menu_client.menu_service_url);

    let metrics = Arc::new(Metrics::new()?);

    let pool = connect(&config.database).await?;

    if config.database.run_migrations {
        SchemaManager::new(pool.clone()).migrate_order_schema().await?;
    } else {
        info!("Schema migrations disabled");
    }

    let order_repository = Arc::new(PgOrderRepository::new(pool, metrics.clone()));
    let menu_client = Arc::new(HttpMenuClient::new(
        &config.menu_client.menu_service_url,
        config.menu_client.request_timeout(),
        metrics.clone(),
    )?);
    let order_service = Arc::new(OrderService::new_with_metrics(
        order_repository,
        menu_client,
        metrics.clone(),
    ));

    let ops_state = OpsState {
        service_name: config.observability.service_name.clone(),
        service_version: config.observability.service_version.clone(),
        metrics,
    };

    let app = create_order_app(order_service, ops_state, &config.server);
    let listener = TcpListener::bind(config.bind_address()).await?;

    serve(listener, app).await
}
