#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::net::TcpListener;

use restaurant_rs::{
    app::{create_menu_app, create_order_app},
    clients::HttpMenuClient,
    config::ServerConfig,
    handlers::OpsState,
    models::{Category, Dish, NewDish, NewOrder, Order, RepositoryError, RepositoryResult},
    repositories::{DishRepository, OrderRepository},
    services::{DishService, OrderService},
    Metrics,
};

/// Dish storage with the same visible behaviour as the PostgreSQL repository
#[derive(Default)]
pub struct InMemoryDishRepository {
    state: Mutex<DishState>,
}

#[derive(Default)]
struct DishState {
    next_id: i64,
    dishes: BTreeMap<i64, Dish>,
    categories: BTreeMap<i64, String>,
}

impl DishState {
    fn ensure_category(&mut self, id: i64, name: &str) {
        self.categories
            .entry(id)
            .or_insert_with(|| name.to_string());
    }

    fn joined(&self, mut dish: Dish) -> Dish {
        dish.category = self.categories.get(&dish.category_id).map(|name| Category {
            id: dish.category_id,
            name: name.clone(),
        });
        dish
    }
}

#[async_trait]
impl DishRepository for InMemoryDishRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Dish>> {
        let state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        Ok(state
            .dishes
            .values()
            .cloned()
            .map(|dish| state.joined(dish))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Dish>> {
        let state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        Ok(state.dishes.get(&id).cloned().map(|dish| state.joined(dish)))
    }

    async fn create(&self, dish: NewDish) -> RepositoryResult<Dish> {
        let mut state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        state.ensure_category(dish.category_id, &dish.category_name);
        state.next_id += 1;

        let stored = Dish {
            id: state.next_id,
            name: dish.name,
            price: dish.price,
            description: dish.description,
            category_id: dish.category_id,
            available_quantity: dish.available_quantity,
            category: None,
        };
        state.dishes.insert(stored.id, stored.clone());
        Ok(state.joined(stored))
    }

    async fn update(&self, id: i64, dish: NewDish) -> RepositoryResult<Option<Dish>> {
        let mut state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        state.ensure_category(dish.category_id, &dish.category_name);

        let Some(stored) = state.dishes.get_mut(&id) else {
            return Ok(None);
        };
        stored.name = dish.name;
        stored.price = dish.price;
        stored.description = dish.description;
        stored.category_id = dish.category_id;
        stored.available_quantity = dish.available_quantity;

        let updated = stored.clone();
        Ok(Some(state.joined(updated)))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        state.dishes.remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: Mutex<(i64, BTreeMap<i64, Order>)>,
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Order>> {
        let state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        Ok(state.1.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        Ok(state.1.get(&id).cloned())
    }

    async fn create(&self, order: NewOrder) -> RepositoryResult<Order> {
        let mut state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        state.0 += 1;

        let stored = Order {
            id: state.0,
            order_number: order.order_number,
            menu_id: order.menu_id,
            quantity: order.quantity,
            table_id: order.table_id,
            status: order.status,
        };
        state.1.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, order: Order) -> RepositoryResult<Order> {
        let mut state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        match state.1.get_mut(&order.id) {
            Some(stored) => {
                *stored = order.clone();
                Ok(order)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().map_err(|_| RepositoryError::ConnectionFailed)?;
        Ok(state.1.remove(&id).is_some())
    }
}

pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_seconds: 5,
        max_request_size: 1024 * 1024,
    }
}

fn ops_state(service_name: &str) -> OpsState {
    OpsState {
        service_name: service_name.to_string(),
        service_version: "test".to_string(),
        metrics: Arc::new(Metrics::new().expect("Failed to create metrics")),
    }
}

/// Serve a router on an ephemeral port and return its base URL
pub async fn spawn_app(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get local address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Failed to serve app");
    });

    format!("http://{}", addr)
}

pub async fn spawn_menu_service() -> String {
    let repository = Arc::new(InMemoryDishRepository::default());
    let service = Arc::new(DishService::new(repository));
    spawn_app(create_menu_app(
        service,
        ops_state("menu-service"),
        &test_server_config(),
    ))
    .await
}

pub async fn spawn_order_service(menu_url: &str) -> String {
    let ops = ops_state("order-service");
    let menu_client = Arc::new(
        HttpMenuClient::new(menu_url, Duration::from_secs(2), ops.metrics.clone())
            .expect("Failed to build menu client"),
    );
    let repository = Arc::new(InMemoryOrderRepository::default());
    let service = Arc::new(OrderService::new(repository, menu_client));
    spawn_app(create_order_app(service, ops, &test_server_config())).await
}

pub struct TestEnvironment {
    pub client: Client,
    pub menu_url: String,
    pub order_url: String,
}

impl TestEnvironment {
    /// Both services, the order service pointed at the menu service
    pub async fn new() -> Self {
        let menu_url = spawn_menu_service().await;
        let order_url = spawn_order_service(&menu_url).await;
        Self {
            client: Client::new(),
            menu_url,
            order_url,
        }
    }

    /// Only the order service, pointed at an arbitrary menu service URL
    pub async fn with_menu_url(menu_url: &str) -> Self {
        let order_url = spawn_order_service(menu_url).await;
        Self {
            client: Client::new(),
            menu_url: menu_url.to_string(),
            order_url,
        }
    }
}
