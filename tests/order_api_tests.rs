#![allow(clippy::needless_borrows_for_generic_args)]

use restaurant_rs::models::{Dish, Order, OrderStatus};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

mod common;
use common::*;

async fn place_order(test_env: &TestEnvironment, menu_id: i64) -> Order {
    let response = test_env
        .client
        .post(&format!("{}/order", test_env.order_url))
        .json(&json!({
            "order_number": 1,
            "menu_id": menu_id,
            "quantity": 2,
            "table_id": 3
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
async fn test_borscht_order_description_end_to_end() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;

    let response = client
        .post(&format!("{}/menu", test_env.menu_url))
        .json(&json!({
            "name": "Borscht",
            "price": 120.5,
            "description": "Classic borscht with meat and sour cream",
            "category_id": 1,
            "available_quantity": 10
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 201);
    let dish: Dish = response.json().await.expect("Failed to parse response");

    let order = place_order(&test_env, dish.id).await;
    assert_eq!(order.status, OrderStatus::InProgress);
    assert_eq!(order.menu_id, dish.id);

    let response = client
        .get(&format!("{}/order/{}/description", test_env.order_url, order.id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let description: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        description,
        json!({
            "order_id": order.id,
            "menu_id": dish.id,
            "description": "Classic borscht with meat and sour cream",
            "price": 120.5
        })
    );
}

#[tokio::test]
async fn test_order_lifecycle() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let base_url = &test_env.order_url;

    // A client-supplied status is ignored on creation
    let response = client
        .post(&format!("{}/order", base_url))
        .json(&json!({
            "order_number": 7,
            "menu_id": 1,
            "quantity": 1,
            "table_id": 2,
            "status": "completed"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 201);
    let order: Order = response.json().await.expect("Failed to parse response");
    assert_eq!(order.status, OrderStatus::InProgress);

    let response = client
        .get(&format!("{}/orders", base_url))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let orders: Vec<Order> = response.json().await.expect("Failed to parse response");
    assert_eq!(orders, vec![order.clone()]);

    let response = client
        .put(&format!("{}/order/{}/status", base_url, order.id))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let completed: Order = response.json().await.expect("Failed to parse response");
    assert_eq!(completed.status, OrderStatus::Completed);
    assert_eq!(completed.quantity, order.quantity);

    let response = client
        .put(&format!("{}/order/{}", base_url, order.id))
        .json(&json!({
            "order_number": 7,
            "menu_id": 1,
            "quantity": 5,
            "table_id": 4
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let overwritten: Order = response.json().await.expect("Failed to parse response");
    assert_eq!(overwritten.quantity, 5);
    assert_eq!(overwritten.table_id, 4);
    // Status is kept when the full update omits it
    assert_eq!(overwritten.status, OrderStatus::Completed);

    let response = client
        .delete(&format!("{}/order/{}", base_url, order.id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .delete(&format!("{}/order/{}", base_url, order.id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({ "error": "order not found" }));
}

#[tokio::test]
async fn test_invalid_status_leaves_order_unchanged() {
    let test_env = TestEnvironment::new().await;
    let order = place_order(&test_env, 1).await;

    for status in ["Unknown", "Completed", " completed", "in-progress", ""] {
        let response = test_env
            .client
            .put(&format!("{}/order/{}/status", test_env.order_url, order.id))
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status().as_u16(), 400, "status {:?}", status);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body, json!({ "error": "invalid status" }));
    }

    let response = test_env
        .client
        .get(&format!("{}/order/{}", test_env.order_url, order.id))
        .send()
        .await
        .expect("Failed to send request");
    let reread: Order = response.json().await.expect("Failed to parse response");
    assert_eq!(reread, order);
}

#[tokio::test]
async fn test_status_update_without_content_type() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let base_url = &test_env.order_url;

    let response = client
        .put(&format!("{}/order/{}/status", base_url, 404))
        .body(r#"{"status":"completed"}"#)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .put(&format!("{}/order/{}", base_url, 404))
        .body("not json at all")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let order = place_order(&test_env, 1).await;
    let response = client
        .put(&format!("{}/order/{}/status", base_url, order.id))
        .body(r#"{"status":"completed"}"#)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .starts_with("invalid request body"));

    let response = client
        .get(&format!("{}/order/{}", base_url, order.id))
        .send()
        .await
        .expect("Failed to send request");
    let reread: Order = response.json().await.expect("Failed to parse response");
    assert_eq!(reread.status, OrderStatus::InProgress);
}

#[tokio::test]
async fn test_missing_order_is_not_found_everywhere() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let base_url = &test_env.order_url;

    let response = client
        .get(&format!("{}/order/{}", base_url, 404))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .put(&format!("{}/order/{}/status", base_url, 404))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    // Existence is checked before the body is looked at
    let response = client
        .put(&format!("{}/order/{}/status", base_url, 404))
        .json(&json!({ "state": "completed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .put(&format!("{}/order/{}", base_url, 404))
        .json(&json!({
            "order_number": 1,
            "menu_id": 1,
            "quantity": 1,
            "table_id": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .delete(&format!("{}/order/{}", base_url, 404))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .get(&format!("{}/order/abc", base_url))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_invalid_order_payloads_are_rejected() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let base_url = &test_env.order_url;

    let response = client
        .post(&format!("{}/order", base_url))
        .json(&json!({ "order_number": 1, "menu_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(&format!("{}/order", base_url))
        .json(&json!({
            "order_number": 1,
            "menu_id": 1,
            "quantity": 0,
            "table_id": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .get(&format!("{}/orders", base_url))
        .send()
        .await
        .expect("Failed to send request");
    let orders: Vec<Order> = response.json().await.expect("Failed to parse response");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_description_of_missing_order_skips_menu_service() {
    let menu_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/menu/\d+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&menu_server)
        .await;

    let test_env = TestEnvironment::with_menu_url(&menu_server.uri()).await;

    let response = test_env
        .client
        .get(&format!("{}/order/{}/description", test_env.order_url, 77))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({ "error": "order not found" }));

    menu_server.verify().await;
}

#[tokio::test]
async fn test_menu_service_failure_is_server_error() {
    let menu_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/menu/\d+$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&menu_server)
        .await;

    let test_env = TestEnvironment::with_menu_url(&menu_server.uri()).await;
    let order = place_order(&test_env, 5).await;

    let response = test_env
        .client
        .get(&format!("{}/order/{}/description", test_env.order_url, order.id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .starts_with("failed to fetch dish details"));
}

#[tokio::test]
async fn test_menu_service_without_dish_is_server_error() {
    // Order references a dish the real menu service does not have
    let test_env = TestEnvironment::new().await;
    let order = place_order(&test_env, 31).await;

    let response = test_env
        .client
        .get(&format!("{}/order/{}/description", test_env.order_url, order.id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 500);
}
