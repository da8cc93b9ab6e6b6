//! HTTP surface tests
//!
//! The router is exercised end to end over the in-memory stores; the
//! Postgres pool is created lazily and only touched by the health check.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use branch_inventory_backend::config::{
    Config, DatabaseConfig, DocumentStoreConfig, JwtConfig, ServerConfig, WarehouseConfig,
};
use branch_inventory_backend::middleware::Claims;
use branch_inventory_backend::{create_app, AppState};
use chrono::Utc;
use common::{resolver, TestStores};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/bip_test".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        document_store: DocumentStoreConfig {
            url: "postgres://localhost/bip_test".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        warehouses: WarehouseConfig {
            aliases: HashMap::new(),
            ..Default::default()
        },
    }
}

fn app(stores: &TestStores) -> Router {
    let db = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/bip_test")
        .unwrap();
    create_app(AppState {
        db,
        config: Arc::new(test_config()),
        stores: stores.stores(),
        resolver: resolver(),
    })
}

fn token(user_id: Uuid, permissions: &[&str]) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        exp: now + 3600,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_warehouse_probe_is_public() {
    let app = app(&TestStores::new());
    let (status, body) = send(&app, Method::GET, "/api/v1/warehouses/normalize?name=G.Edappally", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canonical"], "Edappally Branch");
    assert_eq!(body["is_central"], false);

    let (status, body) = send(&app, Method::GET, "/api/v1/warehouses/match?a=Calicut&b=Kozhikode", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"], true);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app(&TestStores::new());
    let (status, body) = send(&app, Method::GET, "/api/v1/bills", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, Method::GET, "/api/v1/bills", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bill_create_and_duplicate() {
    let stores = TestStores::new();
    let item = stores.items.add_item("Basmati 5kg", Some("BAS-5"), &[]).await;
    let app = app(&stores);
    let token = token(Uuid::new_v4(), &[]);

    let bill = json!({
        "bill_number": "B-100",
        "vendor_id": null,
        "vendor_name": "Acme Traders",
        "warehouse": "WH",
        "status": "open",
        "items": [{
            "item_id": item.to_string(),
            "item_name": "Basmati 5kg",
            "quantity": "4",
            "rate": "25"
        }]
    });

    let (status, body) = send(&app, Method::POST, "/api/v1/bills", Some(&token), Some(bill.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["bill_number"], "B-100");
    assert_eq!(body["warehouse"], "Warehouse");
    assert_eq!(body["warnings"], json!([]));
    assert_eq!(stores.items.on_hand(item, "Warehouse").await, dec!(4));

    let (status, body) = send(&app, Method::POST, "/api/v1/bills", Some(&token), Some(bill)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_DOCUMENT_NUMBER");

    let (status, body) = send(&app, Method::GET, "/api/v1/bills", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_approval_needs_permission_and_stock() {
    let stores = TestStores::new();
    stores
        .items
        .add_item("Item X1", Some("X1"), &[("Warehouse", dec!(4))])
        .await;
    let app = app(&stores);
    let clerk = token(Uuid::new_v4(), &[]);
    let manager = token(Uuid::new_v4(), &["store_orders:approve"]);

    let (status, order) = send(
        &app,
        Method::POST,
        "/api/v1/store-orders",
        Some(&clerk),
        Some(json!({
            "store_warehouse": "Kottayam",
            "items": [{ "item_name": "Item X1", "item_sku": "X1", "quantity": "10" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let approve_uri = format!("/api/v1/store-orders/{}/approve", order["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::POST, &approve_uri, Some(&clerk), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_PERMISSIONS");

    let (status, body) = send(&app, Method::POST, &approve_uri, Some(&manager), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["error"]["details"][0]["shortfall"], "6");
}

#[tokio::test]
async fn test_item_stock_read() {
    let stores = TestStores::new();
    stores
        .items
        .add_item("Item X1", Some("X1"), &[("Warehouse", dec!(50))])
        .await;
    let app = app(&stores);
    let token = token(Uuid::new_v4(), &[]);

    let (status, body) = send(&app, Method::GET, "/api/v1/items/stock?sku=X1&warehouse=main%20warehouse", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"], "Item X1");
    assert_eq!(body["warehouse"], "Warehouse");
    assert_eq!(body["stock_on_hand"], "50");

    let (status, body) = send(&app, Method::GET, "/api/v1/items/stock?sku=NOPE", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ITEM_NOT_FOUND");
}
