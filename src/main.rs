//! Astra - A small document store with a REST API

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use astra::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{SqlxDocumentRepository, SqlxUserRepository},
    },
    services::{AuthService, DocsService, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "astra=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Astra document store...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    let applied = db::migrations::prepare_schema(&pool, config.database.auto_migrate).await?;
    if config.database.auto_migrate {
        tracing::info!("Database migrations completed ({} applied)", applied);
    }

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!(
        "Cache initialized (ttl: {}s, capacity: {})",
        config.cache.ttl_seconds,
        config.cache.max_capacity
    );

    // Create repositories and services
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let docs_repo = SqlxDocumentRepository::boxed(pool.clone());

    let state = AppState {
        auth_service: Arc::new(AuthService::new(user_repo, config.auth.admin_token.clone())),
        docs_service: Arc::new(DocsService::new(docs_repo)),
        sessions: Arc::new(SessionStore::new()),
        cache,
        upload_config: Arc::new(config.upload.clone()),
    };

    // Build router
    let app = api::build_router(state, &config);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
