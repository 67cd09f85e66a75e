use std::sync::Arc;
use tracing::instrument;

use crate::models::{Dish, DishRequest, NewDish, ServiceError, ServiceResult, Validate};
use crate::observability::Metrics;
use crate::repositories::DishRepository;

/// Service for managing the dish catalog
pub struct DishService {
    repository: Arc<dyn DishRepository>,
    metrics: Option<Arc<Metrics>>,
}

impl DishService {
    /// Create a new DishService
    pub fn new(repository: Arc<dyn DishRepository>) -> Self {
        Self {
            repository,
            metrics: None,
        }
    }

    /// Create a new DishService that records business metrics
    pub fn new_with_metrics(repository: Arc<dyn DishRepository>, metrics: Arc<Metrics>) -> Self {
        Self {
            repository,
            metrics: Some(metrics),
        }
    }

    fn record<T>(&self, operation: &str, result: &ServiceResult<T>) {
        if let Some(metrics) = &self.metrics {
            metrics.record_dish_operation(operation, result.is_ok());
        }
    }

    /// List every dish with its category
    #[instrument(skip(self))]
    pub async fn list_dishes(&self) -> ServiceResult<Vec<Dish>> {
        crate::info_with_trace!("Listing dishes");

        let result = self.repository.find_all().await.map_err(ServiceError::from);
        self.record("list", &result);

        let dishes = result?;
        crate::info_with_trace!("Found {} dishes", dishes.len());
        Ok(dishes)
    }

    /// Get a specific dish by ID
    #[instrument(skip(self))]
    pub async fn get_dish(&self, id: i64) -> ServiceResult<Dish> {
        let result = match self.repository.find_by_id(id).await {
            Ok(Some(dish)) => Ok(dish),
            Ok(None) => Err(ServiceError::DishNotFound { id }),
            Err(e) => Err(e.into()),
        };
        self.record("get", &result);
        result
    }

    /// Create a new dish
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_dish(&self, request: DishRequest) -> ServiceResult<Dish> {
        crate::info_with_trace!("Creating dish");

        let result = self.create(request).await;
        self.record("create", &result);

        if let Ok(dish) = &result {
            crate::info_with_trace!(dish_id = dish.id, "Dish created successfully");
        }
        result
    }

    async fn create(&self, request: DishRequest) -> ServiceResult<Dish> {
        request.validate()?;
        Ok(self.repository.create(NewDish::from(request)).await?)
    }

    /// Overwrite every mutable field of an existing dish
    #[instrument(skip(self, request))]
    pub async fn update_dish(&self, id: i64, request: DishRequest) -> ServiceResult<Dish> {
        crate::info_with_trace!("Updating dish");

        let result = self.update(id, request).await;
        self.record("update", &result);
        result
    }

    async fn update(&self, id: i64, request: DishRequest) -> ServiceResult<Dish> {
        request.validate()?;

        if self.repository.find_by_id(id).await?.is_none() {
            return Err(ServiceError::DishNotFound { id });
        }

        // The row can vanish between the lookup and the write
        self.repository
            .update(id, NewDish::from(request))
            .await?
            .ok_or(ServiceError::DishNotFound { id })
    }

    /// Delete a dish. Absent dishes are not reported.
    #[instrument(skip(self))]
    pub async fn delete_dish(&self, id: i64) -> ServiceResult<()> {
        let result = self.repository.delete(id).await.map_err(ServiceError::from);
        self.record("delete", &result);

        if result.is_ok() {
            crate::info_with_trace!("Dish deleted");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, RepositoryError};
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    mock! {
        TestDishRepository {}

        #[async_trait]
        impl DishRepository for TestDishRepository {
            async fn find_all(&self) -> Result<Vec<Dish>, RepositoryError>;
            async fn find_by_id(&self, id: i64) -> Result<Option<Dish>, RepositoryError>;
            async fn create(&self, dish: NewDish) -> Result<Dish, RepositoryError>;
            async fn update(&self, id: i64, dish: NewDish) -> Result<Option<Dish>, RepositoryError>;
            async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
        }
    }

    fn create_test_dish() -> Dish {
        Dish {
            id: 1,
            name: "Borscht".to_string(),
            price: dec!(120.5),
            description: "Classic borscht with meat and sour cream".to_string(),
            category_id: 1,
            available_quantity: 10,
            category: Some(Category {
                id: 1,
                name: String::new(),
            }),
        }
    }

    fn create_test_request() -> DishRequest {
        DishRequest {
            name: "Borscht".to_string(),
            price: dec!(120.5),
            description: "Classic borscht with meat and sour cream".to_string(),
            category_id: 1,
            available_quantity: 10,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_list_dishes_success() {
        let mut mock_repo = MockTestDishRepository::new();
        let dishes = vec![create_test_dish()];

        mock_repo
            .expect_find_all()
            .times(1)
            .returning(move || Ok(dishes.clone()));

        let service = DishService::new(Arc::new(mock_repo));
        let result = service.list_dishes().await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Borscht");
    }

    #[tokio::test]
    async fn test_get_dish_not_found() {
        let mut mock_repo = MockTestDishRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(eq(99))
            .times(1)
            .returning(|_| Ok(None));

        let service = DishService::new(Arc::new(mock_repo));
        let result = service.get_dish(99).await;

        assert!(matches!(result, Err(ServiceError::DishNotFound { id: 99 })));
    }

    #[tokio::test]
    async fn test_create_dish_success() {
        let mut mock_repo = MockTestDishRepository::new();
        let test_dish = create_test_dish();

        mock_repo
            .expect_create()
            .withf(|dish| dish.name == "Borscht" && dish.category_id == 1)
            .times(1)
            .returning(move |_| Ok(test_dish.clone()));

        let metrics = Arc::new(Metrics::new().unwrap());
        let service = DishService::new_with_metrics(Arc::new(mock_repo), metrics.clone());
        let result = service.create_dish(create_test_request()).await.unwrap();

        assert_eq!(result.id, 1);
        assert!(metrics
            .encode()
            .unwrap()
            .contains("dish_operations_total{operation=\"create\",status=\"success\"} 1"));
    }

    #[tokio::test]
    async fn test_create_dish_validation_error() {
        let mut mock_repo = MockTestDishRepository::new();
        mock_repo.expect_create().times(0);

        let service = DishService::new(Arc::new(mock_repo));
        let request = DishRequest {
            price: dec!(-1),
            ..create_test_request()
        };

        let result = service.create_dish(request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_update_dish_not_found() {
        let mut mock_repo = MockTestDishRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));
        mock_repo.expect_update().times(0);

        let service = DishService::new(Arc::new(mock_repo));
        let result = service.update_dish(5, create_test_request()).await;

        assert!(matches!(result, Err(ServiceError::DishNotFound { id: 5 })));
    }

    #[tokio::test]
    async fn test_update_dish_validates_before_lookup() {
        let mut mock_repo = MockTestDishRepository::new();
        mock_repo.expect_find_by_id().times(0);

        let service = DishService::new(Arc::new(mock_repo));
        let request = DishRequest {
            name: "  ".to_string(),
            ..create_test_request()
        };

        let result = service.update_dish(5, request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_update_dish_success() {
        let mut mock_repo = MockTestDishRepository::new();
        let existing = create_test_dish();
        let mut updated = create_test_dish();
        updated.price = dec!(150);

        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        mock_repo
            .expect_update()
            .withf(|id, dish| *id == 1 && dish.price == dec!(150))
            .times(1)
            .returning(move |_, _| Ok(Some(updated.clone())));

        let service = DishService::new(Arc::new(mock_repo));
        let request = DishRequest {
            price: dec!(150),
            ..create_test_request()
        };

        let result = service.update_dish(1, request).await.unwrap();
        assert_eq!(result.price, dec!(150));
    }

    #[tokio::test]
    async fn test_delete_dish_propagates_storage_error() {
        let mut mock_repo = MockTestDishRepository::new();
        mock_repo
            .expect_delete()
            .returning(|_| Err(RepositoryError::ConnectionFailed));

        let service = DishService::new(Arc::new(mock_repo));
        let result = service.delete_dish(1).await;

        assert!(matches!(result, Err(ServiceError::Repository { .. })));
    }
}
