use std::sync::Arc;
use tracing::instrument;

use crate::clients::MenuClient;
use crate::models::{
    CreateOrderRequest, DishDescription, NewOrder, Order, OrderStatus, RepositoryError,
    ServiceError, ServiceResult, UpdateOrderRequest, Validate,
};
use crate::observability::Metrics;
use crate::repositories::OrderRepository;

/// Service for the order lifecycle and the order -> dish lookup
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    menu_client: Arc<dyn MenuClient>,
    metrics: Option<Arc<Metrics>>,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(repository: Arc<dyn OrderRepository>, menu_client: Arc<dyn MenuClient>) -> Self {
        Self {
            repository,
            menu_client,
            metrics: None,
        }
    }

    /// Create a new OrderService that records business metrics
    pub fn new_with_metrics(
        repository: Arc<dyn OrderRepository>,
        menu_client: Arc<dyn MenuClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            menu_client,
            metrics: Some(metrics),
        }
    }

    fn record<T>(&self, operation: &str, result: &ServiceResult<T>) {
        if let Some(metrics) = &self.metrics {
            metrics.record_order_operation(operation, result.is_ok());
        }
    }

    async fn find_order(&self, id: i64) -> ServiceResult<Order> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::OrderNotFound { id })
    }

    async fn save(&self, order: Order) -> ServiceResult<Order> {
        let id = order.id;
        self.repository.update(order).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::OrderNotFound { id },
            other => other.into(),
        })
    }

    async fn place(&self, request: CreateOrderRequest) -> ServiceResult<Order> {
        request.validate()?;
        Ok(self.repository.create(NewOrder::from_request(request)).await?)
    }

    async fn change_status(&self, id: i64, status: &str) -> ServiceResult<Order> {
        let mut order = self.find_order(id).await?;
        order.status = parse_status(status)?;
        self.save(order).await
    }

    async fn overwrite(&self, id: i64, request: UpdateOrderRequest) -> ServiceResult<Order> {
        let mut order = self.find_order(id).await?;
        request.validate()?;

        if let Some(status) = &request.status {
            order.status = parse_status(status)?;
        }
        order.order_number = request.order_number;
        order.menu_id = request.menu_id;
        order.quantity = request.quantity;
        order.table_id = request.table_id;

        self.save(order).await
    }

    async fn compose_description(&self, id: i64) -> ServiceResult<DishDescription> {
        let order = self.find_order(id).await?;
        let dish = self.menu_client.fetch_dish(order.menu_id).await?;
        Ok(DishDescription::compose(&order, dish))
    }

    /// Place a new order. The initial status is always "in progress".
    #[instrument(skip(self, request), fields(order_number = request.order_number, menu_id = request.menu_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> ServiceResult<Order> {
        crate::info_with_trace!("Creating order");

        let result = self.place(request).await;
        self.record("create", &result);

        if let Ok(order) = &result {
            crate::info_with_trace!(order_id = order.id, "Order created successfully");
        }
        result
    }

    /// List every order
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> ServiceResult<Vec<Order>> {
        let result = self.repository.find_all().await.map_err(ServiceError::from);
        self.record("list", &result);

        let orders = result?;
        crate::info_with_trace!("Found {} orders", orders.len());
        Ok(orders)
    }

    /// Get a specific order by ID
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i64) -> ServiceResult<Order> {
        let result = self.find_order(id).await;
        self.record("get", &result);
        result
    }

    /// Move an order to another status.
    ///
    /// The order must exist; the status must be one of `OrderStatus::ALL`
    /// spelled exactly as on the wire.
    #[instrument(skip(self))]
    pub async fn update_order_status(&self, id: i64, status: &str) -> ServiceResult<Order> {
        crate::info_with_trace!("Updating order status");

        let result = self.change_status(id, status).await;
        self.record("update_status", &result);

        if let Err(ServiceError::InvalidStatus { status }) = &result {
            crate::warn_with_trace!(status = %status, "Rejected order status");
        }
        result
    }

    /// Overwrite an order from a full payload
    #[instrument(skip(self, request))]
    pub async fn update_order(&self, id: i64, request: UpdateOrderRequest) -> ServiceResult<Order> {
        crate::info_with_trace!("Updating order");

        let result = self.overwrite(id, request).await;
        self.record("update", &result);
        result
    }

    /// Delete an order. Deleting an absent order is reported as not found.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i64) -> ServiceResult<()> {
        let result = match self.repository.delete(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ServiceError::OrderNotFound { id }),
            Err(e) => Err(e.into()),
        };
        self.record("delete", &result);

        if result.is_ok() {
            crate::info_with_trace!("Order deleted");
        }
        result
    }

    /// Compose the order with the description and price of its dish.
    ///
    /// The order is resolved locally first; the menu service is only
    /// called for orders that exist. Downstream failures are not retried.
    #[instrument(skip(self))]
    pub async fn describe_order(&self, id: i64) -> ServiceResult<DishDescription> {
        let result = self.compose_description(id).await;
        self.record("describe", &result);

        if let Err(ServiceError::MenuService { source }) = &result {
            crate::error_with_trace!(error = %source, "Dish lookup failed");
        }
        result
    }
}

fn parse_status(status: &str) -> ServiceResult<OrderStatus> {
    status
        .parse::<OrderStatus>()
        .map_err(|_| ServiceError::InvalidStatus {
            status: status.to_string(),
        })
}
