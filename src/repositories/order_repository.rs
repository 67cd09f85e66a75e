use async_trait::async_trait;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{NewOrder, Order, OrderStatus, RepositoryError, RepositoryResult};
use crate::observability::{DatabaseTracingMiddleware, Metrics};

/// Trait defining the interface for order data access operations
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find all orders ordered by id
    async fn find_all(&self) -> RepositoryResult<Vec<Order>>;

    /// Find an order by its ID
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>>;

    /// Insert a new order
    async fn create(&self, order: NewOrder) -> RepositoryResult<Order>;

    /// Persist every field of an existing order
    async fn update(&self, order: Order) -> RepositoryResult<Order>;

    /// Delete an order, returning whether a row was removed
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;
}

const SELECT_ORDER: &str =
    "SELECT id, order_number, menu_id, quantity, table_id, status FROM orders";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: i64,
    menu_id: i64,
    quantity: i32,
    table_id: i64,
    status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|message| RepositoryError::InvalidData { message })?;

        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            menu_id: row.menu_id,
            quantity: row.quantity,
            table_id: row.table_id,
            status,
        })
    }
}

/// PostgreSQL implementation of the OrderRepository trait
pub struct PgOrderRepository {
    pool: PgPool,
    tracer: DatabaseTracingMiddleware,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self {
            tracer: DatabaseTracingMiddleware::new(metrics).with_pool(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<Order>> {
        let query = format!("{} ORDER BY id", SELECT_ORDER);
        let rows = self
            .tracer
            .trace_operation("select", "orders", async {
                sqlx::query_as::<_, OrderRow>(&query)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        info!(count = rows.len(), "Orders loaded");
        rows.into_iter().map(Order::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let query = format!("{} WHERE id = $1", SELECT_ORDER);
        let row = self
            .tracer
            .trace_operation("select", "orders", async {
                sqlx::query_as::<_, OrderRow>(&query)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        match row {
            Some(row) => Ok(Some(Order::try_from(row)?)),
            None => {
                info!("Order not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, order), fields(order_number = order.order_number, menu_id = order.menu_id))]
    async fn create(&self, order: NewOrder) -> RepositoryResult<Order> {
        let row = self
            .tracer
            .trace_operation("insert", "orders", async {
                sqlx::query_as::<_, OrderRow>(
                    "INSERT INTO orders (order_number, menu_id, quantity, table_id, status) \
                     VALUES ($1, $2, $3, $4, $5) \
                     RETURNING id, order_number, menu_id, quantity, table_id, status",
                )
                .bind(order.order_number)
                .bind(order.menu_id)
                .bind(order.quantity)
                .bind(order.table_id)
                .bind(order.status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(RepositoryError::from)
            })
            .await?;

        info!(order_id = row.id, "Order created");
        Order::try_from(row)
    }

    #[instrument(skip(self, order), fields(order_id = order.id, status = %order.status))]
    async fn update(&self, order: Order) -> RepositoryResult<Order> {
        let row = self
            .tracer
            .trace_operation("update", "orders", async {
                sqlx::query_as::<_, OrderRow>(
                    "UPDATE orders SET order_number = $2, menu_id = $3, quantity = $4, \
                     table_id = $5, status = $6 WHERE id = $1 \
                     RETURNING id, order_number, menu_id, quantity, table_id, status",
                )
                .bind(order.id)
                .bind(order.order_number)
                .bind(order.menu_id)
                .bind(order.quantity)
                .bind(order.table_id)
                .bind(order.status.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(RepositoryError::from)
            })
            .await?;

        match row {
            Some(row) => {
                info!("Order updated");
                Order::try_from(row)
            }
            None => {
                warn!("Order disappeared before update");
                Err(RepositoryError::NotFound)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let result = self
            .tracer
            .trace_operation("delete", "orders", async {
                sqlx::query("DELETE FROM orders WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        let deleted = result.rows_affected() > 0;
        info!(deleted = deleted, "Order delete executed");
        Ok(deleted)
    }
}
