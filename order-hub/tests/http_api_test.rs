//! HTTP surface tests
//!
//! Requests go through the fully layered app with `oneshot`, no socket.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use order_hub::api;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::test_state;

fn app() -> Router {
    api::build_app(test_state())
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn open_order(app: &Router) -> String {
    let (status, body) = call(app, post("/api/orders", json!({ "restaurant_id": 1, "table_id": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["order"]["order_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = call(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["total_events"], 0);
}

#[tokio::test]
async fn test_order_flow_over_http() {
    let app = app();
    let order_id = open_order(&app).await;

    let (status, body) = call(
        &app,
        post(
            &format!("/api/orders/{order_id}/items"),
            json!({ "line_key": "a1", "menu_item_id": 5, "quantity": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["totals"]["net"], 19.0);

    let (status, body) = call(&app, post(&format!("/api/orders/{order_id}/submit"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "ordered");
    let ticket_id = body["data"]["order"]["tickets"][0]["ticket_id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = call(
        &app,
        post(&format!("/api/tickets/{ticket_id}/advance"), json!({ "to": "preparing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ticket"]["status"], "preparing");
    assert_eq!(body["data"]["order"]["status"], "preparing");

    let (status, body) = call(
        &app,
        get(&format!("/api/orders/{order_id}/state?session_id=guest-1&role=customer")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["items"][0]["name"], "Burger");
    assert!(body["data"]["order"].get("tickets").is_none());

    let (status, body) = call(&app, get(&format!("/api/orders/{order_id}/events?limit=2"))).await;
    assert_eq!(status, StatusCode::OK);
    let events = body["data"]["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0]["sequence"].as_u64() > events[1]["sequence"].as_u64());
    assert!(body["data"]["next_before_id"].is_u64());
}

#[tokio::test]
async fn test_idempotency_header() {
    let app = app();
    let order_id = open_order(&app).await;

    let request = || {
        Request::post(format!("/api/orders/{order_id}/items"))
            .header("content-type", "application/json")
            .header("Idempotency-Key", "tap-7")
            .header("X-Event-Source", "guest")
            .body(Body::from(
                json!({ "line_key": "a1", "menu_item_id": 6, "quantity": 1 }).to_string(),
            ))
            .unwrap()
    };

    let (_, first) = call(&app, request()).await;
    let (status, retry) = call(&app, request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["duplicate"], false);
    assert_eq!(retry["data"]["duplicate"], true);
    assert_eq!(retry["data"]["events"][0]["sequence"], first["data"]["events"][0]["sequence"]);
    assert_eq!(retry["data"]["events"][0]["source"], "guest");
}

#[tokio::test]
async fn test_retried_open_lands_on_one_order() {
    let app = app();
    let open = |order_id: Option<&str>| {
        let mut body = json!({ "restaurant_id": 1, "table_id": 7 });
        if let Some(order_id) = order_id {
            body["order_id"] = json!(order_id);
        }
        Request::post("/api/orders")
            .header("content-type", "application/json")
            .header("Idempotency-Key", "open-7")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    // A key alone cannot name the order it belongs to
    let (status, _) = call(&app, open(None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, first) = call(&app, open(Some("ord-7"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, retry) = call(&app, open(Some("ord-7"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["duplicate"], false);
    assert_eq!(retry["data"]["duplicate"], true);
    assert_eq!(retry["data"]["order"]["order_id"], "ord-7");
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();

    let (status, body) = call(&app, get("/api/orders/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_ne!(body["code"], 0);

    let order_id = open_order(&app).await;

    // DTO validation
    let (status, _) = call(
        &app,
        post(
            &format!("/api/orders/{order_id}/items"),
            json!({ "line_key": "", "menu_item_id": 5, "quantity": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown event source header
    let request = Request::post(format!("/api/orders/{order_id}/submit"))
        .header("X-Event-Source", "robot")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Backwards status move
    let (status, _) = call(
        &app,
        post(
            &format!("/api/orders/{order_id}/status"),
            json!({ "from": "opened", "to": "opened" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown ticket
    let (status, _) = call(
        &app,
        post("/api/tickets/nope/advance", json!({ "to": "preparing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_and_remove() {
    let app = app();
    let order_id = open_order(&app).await;

    let (status, body) = call(
        &app,
        post(
            &format!("/api/orders/{order_id}/participants"),
            json!({ "session_id": "guest-1", "role": "customer" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["locale"], "en");

    call(
        &app,
        post(
            &format!("/api/orders/{order_id}/items"),
            json!({ "line_key": "a1", "menu_item_id": 6, "quantity": 1 }),
        ),
    )
    .await;

    let request = Request::delete(format!("/api/orders/{order_id}/items/a1"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["items"][0]["status"], "removed");
    assert_eq!(body["data"]["order"]["totals"]["net"], 0.0);
}
