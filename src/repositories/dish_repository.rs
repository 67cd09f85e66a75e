use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{Category, Dish, NewDish, RepositoryError, RepositoryResult};
use crate::observability::{DatabaseTracingMiddleware, Metrics};

/// Trait defining the interface for dish data access operations
#[async_trait]
pub trait DishRepository: Send + Sync {
    /// Find all dishes, category joined, ordered by id
    async fn find_all(&self) -> RepositoryResult<Vec<Dish>>;

    /// Find a dish by its ID
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Dish>>;

    /// Insert a dish, creating its category row if it does not exist yet
    async fn create(&self, dish: NewDish) -> RepositoryResult<Dish>;

    /// Overwrite every field of an existing dish. Returns `None` when no row matches.
    async fn update(&self, id: i64, dish: NewDish) -> RepositoryResult<Option<Dish>>;

    /// Delete a dish. Deleting an absent id is not an error.
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}

const SELECT_DISH: &str = "SELECT m.id, m.name, m.price, m.description, m.category_id, \
     m.available_quantity, c.id AS joined_category_id, c.name AS category_name \
     FROM menus m LEFT JOIN categories c ON c.id = m.category_id";

#[derive(Debug, sqlx::FromRow)]
struct DishRow {
    id: i64,
    name: String,
    price: Decimal,
    description: String,
    category_id: i64,
    available_quantity: i32,
    joined_category_id: Option<i64>,
    category_name: Option<String>,
}

impl From<DishRow> for Dish {
    fn from(row: DishRow) -> Self {
        let category = row.joined_category_id.map(|id| Category {
            id,
            name: row.category_name.unwrap_or_default(),
        });

        Dish {
            id: row.id,
            name: row.name,
            price: row.price,
            description: row.description,
            category_id: row.category_id,
            available_quantity: row.available_quantity,
            category,
        }
    }
}

/// PostgreSQL implementation of the DishRepository trait
pub struct PgDishRepository {
    pool: PgPool,
    tracer: DatabaseTracingMiddleware,
}

impl PgDishRepository {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self {
            tracer: DatabaseTracingMiddleware::new(metrics).with_pool(pool.clone()),
            pool,
        }
    }

    async fn ensure_category(&self, id: i64, name: &str) -> RepositoryResult<()> {
        self.tracer
            .trace_operation("insert", "categories", async {
                sqlx::query(
                    "INSERT INTO categories (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
                )
                .bind(id)
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(RepositoryError::from)
            })
            .await
            .map(|_| ())
    }

    async fn fetch_one(&self, id: i64) -> RepositoryResult<Option<Dish>> {
        let query = format!("{} WHERE m.id = $1", SELECT_DISH);
        let row = self
            .tracer
            .trace_operation("select", "menus", async {
                sqlx::query_as::<_, DishRow>(&query)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        Ok(row.map(Dish::from))
    }
}

#[async_trait]
impl DishRepository for PgDishRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<Dish>> {
        let query = format!("{} ORDER BY m.id", SELECT_DISH);
        let rows = self
            .tracer
            .trace_operation("select", "menus", async {
                sqlx::query_as::<_, DishRow>(&query)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        info!(count = rows.len(), "Dishes loaded");
        Ok(rows.into_iter().map(Dish::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Dish>> {
        let dish = self.fetch_one(id).await?;
        if dish.is_none() {
            info!("Dish not found");
        }
        Ok(dish)
    }

    #[instrument(skip(self, dish), fields(name = %dish.name, category_id = dish.category_id))]
    async fn create(&self, dish: NewDish) -> RepositoryResult<Dish> {
        self.ensure_category(dish.category_id, &dish.category_name)
            .await?;

        let id: i64 = self
            .tracer
            .trace_operation("insert", "menus", async {
                sqlx::query_scalar(
                    "INSERT INTO menus (name, price, description, category_id, available_quantity) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING id",
                )
                .bind(&dish.name)
                .bind(dish.price)
                .bind(&dish.description)
                .bind(dish.category_id)
                .bind(dish.available_quantity)
                .fetch_one(&self.pool)
                .await
                .map_err(RepositoryError::from)
            })
            .await?;

        info!(dish_id = id, "Dish created");

        // The row was just inserted; a concurrent delete is the only way this is absent
        self.fetch_one(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self, dish))]
    async fn update(&self, id: i64, dish: NewDish) -> RepositoryResult<Option<Dish>> {
        self.ensure_category(dish.category_id, &dish.category_name)
            .await?;

        let result = self
            .tracer
            .trace_operation("update", "menus", async {
                sqlx::query(
                    "UPDATE menus SET name = $2, price = $3, description = $4, \
                     category_id = $5, available_quantity = $6 WHERE id = $1",
                )
                .bind(id)
                .bind(&dish.name)
                .bind(dish.price)
                .bind(&dish.description)
                .bind(dish.category_id)
                .bind(dish.available_quantity)
                .execute(&self.pool)
                .await
                .map_err(RepositoryError::from)
            })
            .await?;

        if result.rows_affected() == 0 {
            info!("Dish not found for update");
            return Ok(None);
        }

        info!("Dish updated");
        self.fetch_one(id).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = self
            .tracer
            .trace_operation("delete", "menus", async {
                sqlx::query("DELETE FROM menus WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        info!(rows_affected = result.rows_affected(), "Dish delete executed");
        Ok(())
    }
}
