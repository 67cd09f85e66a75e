use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{error, info, instrument};

use crate::config::DatabaseConfig;
use crate::models::{RepositoryError, RepositoryResult};

/// Open the connection pool shared by every repository of a service
#[instrument(skip(config), fields(max_connections = config.db_max_connections))]
pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<PgPool> {
    info!("Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to PostgreSQL");
            RepositoryError::from(e)
        })?;

    info!("PostgreSQL connection pool ready");
    Ok(pool)
}

/// Applies the embedded schema migrations of each service
pub struct SchemaManager {
    pool: PgPool,
}

impl SchemaManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the categories and menus tables
    pub async fn migrate_menu_schema(&self) -> RepositoryResult<()> {
        self.run("menu", sqlx::migrate!("./migrations/menu")).await
    }

    /// Create the orders table
    pub async fn migrate_order_schema(&self) -> RepositoryResult<()> {
        self.run("order", sqlx::migrate!("./migrations/order")).await
    }

    #[instrument(skip(self, migrator))]
    async fn run(&self, schema: &str, mut migrator: Migrator) -> RepositoryResult<()> {
        info!("Running schema migrations");

        // Both services may share one database and its migration history
        migrator.set_ignore_missing(true);
        migrator.run(&self.pool).await.map_err(|e| {
            error!(error = %e, "Schema migration failed");
            RepositoryError::from(e)
        })?;

        info!("Schema migrations applied");
        Ok(())
    }
}
