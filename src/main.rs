use tracing_subscriber::EnvFilter;

use datecal_api::config::config;
use datecal_api::database::manager::DatabaseManager;
use datecal_api::{auth, is_production, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    tracing::info!("Starting datecal-api in {:?} mode", config.environment);
    if is_production!() && config.security.auth0_domain.is_none() {
        tracing::warn!("AUTH0_DOMAIN is not set; falling back to HS256 shared-secret tokens");
    }

    auth::prime_verifier().await;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("datecal-api listening on http://{}", bind_addr);

    axum::serve(listener, routes::app())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
