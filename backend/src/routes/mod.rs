//! Route definitions for the Branch Inventory Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Warehouse name probes (public)
        .nest("/warehouses", warehouse_routes())
        // Protected routes - purchase bills
        .nest("/bills", bill_routes(state.clone()))
        // Protected routes - vendor credits
        .nest("/vendor-credits", vendor_credit_routes(state.clone()))
        // Protected routes - store orders
        .nest("/store-orders", store_order_routes(state.clone()))
        // Protected routes - transfer orders
        .nest("/transfer-orders", transfer_order_routes(state.clone()))
        // Protected routes - item stock reads
        .nest("/items", item_routes(state))
}

fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/normalize", get(handlers::normalize_warehouse))
        .route("/match", get(handlers::match_warehouses))
}

/// Bill routes (protected)
fn bill_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_bills).post(handlers::create_bill))
        .route(
            "/:bill_id",
            get(handlers::get_bill)
                .put(handlers::update_bill)
                .delete(handlers::delete_bill),
        )
        .route(
            "/from-purchase-order/:purchase_order_id",
            post(handlers::create_bill_from_purchase_order),
        )
        .route(
            "/from-receive/:receive_id",
            post(handlers::create_bill_from_receive),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Vendor credit routes (protected)
fn vendor_credit_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_vendor_credits).post(handlers::create_vendor_credit),
        )
        .route(
            "/:credit_id",
            get(handlers::get_vendor_credit)
                .put(handlers::update_vendor_credit)
                .delete(handlers::delete_vendor_credit),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Store order routes (protected)
fn store_order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_store_orders).post(handlers::create_store_order),
        )
        .route(
            "/:store_order_id",
            get(handlers::get_store_order).delete(handlers::delete_store_order),
        )
        .route(
            "/:store_order_id/approve",
            post(handlers::approve_store_order),
        )
        .route("/:store_order_id/reject", post(handlers::reject_store_order))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Transfer order routes (protected)
fn transfer_order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transfer_orders))
        .route("/:transfer_order_id", get(handlers::get_transfer_order))
        .route(
            "/:transfer_order_id/complete",
            post(handlers::complete_transfer_order),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Item stock routes (protected)
fn item_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stock", get(handlers::get_item_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
