use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use restaurant_rs::{
    app::{create_menu_app, serve},
    handlers::OpsState,
    init_observability,
    repositories::{connect, PgDishRepository, SchemaManager},
    services::DishService,
    Config, Metrics, ServiceKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment(ServiceKind::Menu)?;

    init_observability(&config.observability)?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new()?);

    let pool = connect(&config.database).await?;

    if config.database.run_migrations {
        SchemaManager::new(pool.clone()).migrate_menu_schema().await?;
    } else {
        info!("Schema migrations disabled");
    }

    let dish_repository = Arc::new(PgDishRepository::new(pool, metrics.clone()));
    let dish_service = Arc::new(DishService::new_with_metrics(
        dish_repository,
        metrics.clone(),
    ));

    let ops_state = OpsState {
        service_name: config.observability.service_name.clone(),
        service_version: config.observability.service_version.clone(),
        metrics,
    };

    let app = create_menu_app(dish_service, ops_state, &config.server);
    let listener = TcpListener::bind(config.bind_address()).await?;

    serve(listener, app).await
}
