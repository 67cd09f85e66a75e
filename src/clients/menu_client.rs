use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::models::{DishSnapshot, MenuClientError};
use crate::observability::Metrics;

/// Read access to the menu service, as seen by the order service
#[async_trait]
pub trait MenuClient: Send + Sync {
    /// Fetch the description and price of a dish
    async fn fetch_dish(&self, dish_id: i64) -> Result<DishSnapshot, MenuClientError>;
}

/// Calls `GET {base_url}/menu/{id}` on the menu service. No retries.
pub struct HttpMenuClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl HttpMenuClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Result<Self, MenuClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MenuClientError::Connection {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            metrics,
        })
    }

    pub fn dish_url(&self, dish_id: i64) -> String {
        format!("{}/menu/{}", self.base_url, dish_id)
    }

    async fn request(&self, dish_id: i64) -> Result<DishSnapshot, MenuClientError> {
        let response = self
            .client
            .get(self.dish_url(dish_id))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MenuClientError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        decode_dish_snapshot(&body)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> MenuClientError {
        if error.is_timeout() {
            MenuClientError::Timeout {
                timeout_ms: self.timeout.as_millis(),
            }
        } else {
            MenuClientError::Connection {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl MenuClient for HttpMenuClient {
    #[instrument(skip(self), fields(menu.url = %self.dish_url(dish_id)))]
    async fn fetch_dish(&self, dish_id: i64) -> Result<DishSnapshot, MenuClientError> {
        let start_time = Instant::now();
        let result = self.request(dish_id).await;
        let duration_seconds = start_time.elapsed().as_secs_f64();

        let outcome = match &result {
            Ok(_) => "success",
            Err(MenuClientError::Connection { .. }) => "connection",
            Err(MenuClientError::Timeout { .. }) => "timeout",
            Err(MenuClientError::UnexpectedStatus { .. }) => "unexpected_status",
            Err(MenuClientError::Decode { .. }) => "decode",
        };
        self.metrics
            .record_menu_client_request(outcome, duration_seconds);

        match &result {
            Ok(_) => info!(duration_ms = start_time.elapsed().as_millis(), "Dish fetched"),
            Err(e) => warn!(
                error = %e,
                retryable = e.is_retryable(),
                "Menu service call failed"
            ),
        }

        result
    }
}

/// Decode the menu service's dish representation into the fields the
/// order service depends on, naming the field that could not be read.
pub fn decode_dish_snapshot(body: &[u8]) -> Result<DishSnapshot, MenuClientError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| MenuClientError::Decode {
        field: "body".to_string(),
        reason: e.to_string(),
    })?;

    let object = value.as_object().ok_or_else(|| MenuClientError::Decode {
        field: "body".to_string(),
        reason: "expected a JSON object".to_string(),
    })?;

    let description = required_field(object, "description")?
        .as_str()
        .ok_or_else(|| wrong_type("description", "a string"))?
        .to_string();

    let price = match required_field(object, "price")? {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| number.as_f64().and_then(Decimal::from_f64))
            .ok_or_else(|| MenuClientError::Decode {
                field: "price".to_string(),
                reason: format!("{} is not a representable decimal", number),
            })?,
        _ => return Err(wrong_type("price", "a number")),
    };

    Ok(DishSnapshot { description, price })
}

fn required_field<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a Value, MenuClientError> {
    object.get(field).ok_or_else(|| MenuClientError::Decode {
        field: field.to_string(),
        reason: "missing".to_string(),
    })
}

fn wrong_type(field: &str, expected: &str) -> MenuClientError {
    MenuClientError::Decode {
        field: field.to_string(),
        reason: format!("expected {}", expected),
    }
}
