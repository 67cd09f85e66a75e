// Services module - business logic layer

pub mod dish_service;
pub mod order_service;

pub use dish_service::DishService;
pub use order_service::OrderService;
