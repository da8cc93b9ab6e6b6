//! Branch Inventory Platform - Backend
//!
//! Purchase bills, vendor credits and store replenishment for a chain of
//! branch warehouses fed by one central warehouse.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::WarehouseNameResolver;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::Stores;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub stores: Stores,
    pub resolver: Arc<WarehouseNameResolver>,
}

impl AppState {
    /// Wire the Postgres stores over the primary and document pools
    pub fn new(db: sqlx::PgPool, documents: sqlx::PgPool, config: Config) -> Self {
        let resolver = Arc::new(config.warehouses.build_resolver());
        Self {
            stores: Stores::postgres(db.clone(), documents),
            db,
            config: Arc::new(config),
            resolver,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Branch Inventory Platform API v1.0"
}
