//! Branch Inventory Platform - Backend Server

use std::{net::SocketAddr, time::Duration};

use branch_inventory_backend::{create_app, AppState, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bip_server=debug,branch_inventory_backend=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Branch Inventory Server");
    tracing::info!("Environment: {}", config.environment);

    tracing::info!("Connecting to primary database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connecting to document store...");
    let document_pool = PgPoolOptions::new()
        .max_connections(config.document_store.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.document_store.url)
        .await?;

    tracing::info!("Database connections established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        if config.document_store.url != config.database.url {
            sqlx::migrate!("./migrations").run(&document_pool).await?;
        }
        tracing::info!("Migrations completed");
    }

    let port = config.server.port;
    let app = create_app(AppState::new(db_pool, document_pool, config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
