use std::sync::Arc;

use anyhow::{bail, Context};
use server::advisor::Advisor;
use server::config;
use server::db;
use server::routes;
use server::store::{MemoryStore, PgStore, SharedStore};

use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

/// Postgres when DATABASE_URL is set, otherwise records loaded from RECORDS_FILE.
async fn open_store(config: &config::Config) -> anyhow::Result<SharedStore> {
    if let Some(database_url) = &config.database_url {
        tracing::info!("Connecting to database...");
        let pool = db::pool::create_pool(database_url)
            .await
            .context("Failed to connect to database")?;

        tracing::info!("Running migrations...");
        db::pool::run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;

        return Ok(Arc::new(PgStore::new(pool)));
    }

    if let Some(path) = &config.records_file {
        let store = MemoryStore::load(path)
            .await
            .with_context(|| format!("Failed to load records from {}", path.display()))?;
        return Ok(Arc::new(store));
    }

    bail!("Set DATABASE_URL or RECORDS_FILE")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();
    let store = open_store(&config).await?;
    let advisor = Advisor::new(store, config.min_games);

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(advisor)
        .layer(CompressionLayer::new())
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind")?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
