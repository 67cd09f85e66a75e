// Repositories module - data access layer

pub mod dish_repository;
pub mod order_repository;
pub mod schema_manager;

pub use dish_repository::{DishRepository, PgDishRepository};
pub use order_repository::{OrderRepository, PgOrderRepository};
pub use schema_manager::{connect, SchemaManager};
