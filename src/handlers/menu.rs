use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::errors::{invalid_body, path_id, service_error_to_response, ApiError};
use crate::models::{Dish, DishRequest};
use crate::services::DishService;

/// Shared state of the menu routes
#[derive(Clone)]
pub struct MenuState {
    pub dish_service: Arc<DishService>,
}

/// Create the menu router
pub fn create_menu_router(dish_service: Arc<DishService>) -> Router {
    let state = MenuState { dish_service };

    Router::new()
        .route("/menu", get(list_dishes).post(create_dish))
        .route(
            "/menu/:id",
            get(get_dish).put(update_dish).delete(delete_dish),
        )
        .with_state(state)
}

/// List all dishes with their category
#[instrument(name = "list_dishes", skip(state))]
pub async fn list_dishes(State(state): State<MenuState>) -> Result<Json<Vec<Dish>>, ApiError> {
    match state.dish_service.list_dishes().await {
        Ok(dishes) => Ok(Json(dishes)),
        Err(err) => {
            error!("Failed to list dishes: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a specific dish by ID
#[instrument(name = "get_dish", skip(state, id))]
pub async fn get_dish(
    State(state): State<MenuState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Dish>, ApiError> {
    let id = path_id(id)?;

    state
        .dish_service
        .get_dish(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Create a new dish
#[instrument(name = "create_dish", skip(state, payload))]
pub async fn create_dish(
    State(state): State<MenuState>,
    payload: Result<Json<DishRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Dish>), ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    info!("Creating dish: {}", request.name);

    match state.dish_service.create_dish(request).await {
        Ok(dish) => {
            info!(dish_id = dish.id, "Dish created");
            Ok((StatusCode::CREATED, Json(dish)))
        }
        Err(err) => {
            error!("Failed to create dish: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Replace every mutable field of a dish
#[instrument(name = "update_dish", skip(state, id, payload))]
pub async fn update_dish(
    State(state): State<MenuState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DishRequest>, JsonRejection>,
) -> Result<Json<Dish>, ApiError> {
    let id = path_id(id)?;
    let Json(request) = payload.map_err(invalid_body)?;

    match state.dish_service.update_dish(id, request).await {
        Ok(dish) => Ok(Json(dish)),
        Err(err) => {
            error!("Failed to update dish {}: {}", id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Delete a dish
#[instrument(name = "delete_dish", skip(state, id))]
pub async fn delete_dish(
    State(state): State<MenuState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id(id)?;

    match state.dish_service.delete_dish(id).await {
        Ok(()) => Ok(Json(json!({ "message": "dish deleted" }))),
        Err(err) => {
            error!("Failed to delete dish {}: {}", id, err);
            Err(service_error_to_response(err))
        }
    }
}
