use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Order as stored by the order service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: i64,
    pub menu_id: i64,
    pub quantity: i32,
    pub table_id: i64,
    pub status: OrderStatus,
}

/// Request model for placing an order.
///
/// Any `status` sent by the client is ignored; unknown fields are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub order_number: i64,
    pub menu_id: i64,
    pub quantity: i32,
    pub table_id: i64,
}

/// Request model for overwriting an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub order_number: i64,
    pub menu_id: i64,
    pub quantity: i32,
    pub table_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of `PUT /order/:id/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Order fields handed to the repository for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: i64,
    pub menu_id: i64,
    pub quantity: i32,
    pub table_id: i64,
    pub status: OrderStatus,
}

/// Dish fields the order service relies on from the menu service.
///
/// This is the whole inter-service contract: everything else in the
/// menu response is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishSnapshot {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Result of the composed order -> dish lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishDescription {
    pub order_id: i64,
    pub menu_id: i64,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl NewOrder {
    /// New orders always start in progress, whatever the client asked for
    pub fn from_request(request: CreateOrderRequest) -> Self {
        Self {
            order_number: request.order_number,
            menu_id: request.menu_id,
            quantity: request.quantity,
            table_id: request.table_id,
            status: OrderStatus::initial(),
        }
    }
}

impl DishDescription {
    pub fn compose(order: &Order, dish: DishSnapshot) -> Self {
        Self {
            order_id: order.id,
            menu_id: order.menu_id,
            description: dish.description,
            price: dish.price,
        }
    }
}
