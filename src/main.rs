mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod routes;
mod services;
mod state;

use crate::config::Config;
use crate::services::storage::ObjectStore;
use crate::state::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facet=info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;
    let port = config.port;

    tracing::info!("Starting Facet server on port {}", port);

    // Open database
    let pool = db::connect(&config.database_url).await?;
    tracing::info!("Database pool ready, schema applied");

    // Object store client
    let storage = ObjectStore::from_config(&config).await;
    tracing::info!("Object store ready (bucket {})", config.s3_bucket);

    // Build state
    let state = AppState {
        db: pool,
        storage: Arc::new(storage),
        config: Arc::new(config),
    };

    // Init health tracking
    routes::health::init_start_time();

    // Build router
    let app = routes::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
