use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::errors::{invalid_body, path_id, service_error_to_response, ApiError};
use crate::models::{
    CreateOrderRequest, DishDescription, Order, UpdateOrderRequest, UpdateStatusRequest,
};
use crate::services::OrderService;

/// Shared state of the order routes
#[derive(Clone)]
pub struct OrderState {
    pub order_service: Arc<OrderService>,
}

/// Create the order router
pub fn create_order_router(order_service: Arc<OrderService>) -> Router {
    let state = OrderState { order_service };

    Router::new()
        .route("/orders", get(list_orders))
        .route("/order", post(create_order))
        .route(
            "/order/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/order/:id/status", put(update_order_status))
        .route("/order/:id/description", get(get_dish_description))
        .with_state(state)
}

/// Place an order
#[instrument(name = "create_order", skip(state, payload))]
pub async fn create_order(
    State(state): State<OrderState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;

    match state.order_service.create_order(request).await {
        Ok(order) => {
            info!(order_id = order.id, "Order created");
            Ok((StatusCode::CREATED, Json(order)))
        }
        Err(err) => {
            error!("Failed to create order: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// List all orders
#[instrument(name = "list_orders", skip(state))]
pub async fn list_orders(State(state): State<OrderState>) -> Result<Json<Vec<Order>>, ApiError> {
    state
        .order_service
        .list_orders()
        .await
        .map(Json)
        .map_err(|err| {
            error!("Failed to list orders: {}", err);
            service_error_to_response(err)
        })
}

/// Get a specific order by ID
#[instrument(name = "get_order", skip(state, id))]
pub async fn get_order(
    State(state): State<OrderState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Order>, ApiError> {
    let id = path_id(id)?;

    state
        .order_service
        .get_order(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Change the status of an order.
///
/// A missing order answers 404 even when the body is malformed.
#[instrument(name = "update_order_status", skip(state, id, payload))]
pub async fn update_order_status(
    State(state): State<OrderState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let id = path_id(id)?;

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state
                .order_service
                .get_order(id)
                .await
                .map_err(service_error_to_response)?;
            return Err(invalid_body(rejection));
        }
    };

    match state
        .order_service
        .update_order_status(id, &request.status)
        .await
    {
        Ok(order) => {
            info!(order_id = id, status = %order.status, "Order status updated");
            Ok(Json(order))
        }
        Err(err) => {
            error!("Failed to update status of order {}: {}", id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Overwrite an order
#[instrument(name = "update_order", skip(state, id, payload))]
pub async fn update_order(
    State(state): State<OrderState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let id = path_id(id)?;

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state
                .order_service
                .get_order(id)
                .await
                .map_err(service_error_to_response)?;
            return Err(invalid_body(rejection));
        }
    };

    state
        .order_service
        .update_order(id, request)
        .await
        .map(Json)
        .map_err(|err| {
            error!("Failed to update order {}: {}", id, err);
            service_error_to_response(err)
        })
}

/// Delete an order
#[instrument(name = "delete_order", skip(state, id))]
pub async fn delete_order(
    State(state): State<OrderState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id(id)?;

    match state.order_service.delete_order(id).await {
        Ok(()) => Ok(Json(json!({ "message": "order deleted" }))),
        Err(err) => Err(service_error_to_response(err)),
    }
}

/// Description and price of the dish an order refers to
#[instrument(name = "get_dish_description", skip(state, id))]
pub async fn get_dish_description(
    State(state): State<OrderState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DishDescription>, ApiError> {
    let id = path_id(id)?;

    match state.order_service.describe_order(id).await {
        Ok(description) => Ok(Json(description)),
        Err(err) => {
            error!("Failed to describe order {}: {}", id, err);
            Err(service_error_to_response(err))
        }
    }
}
