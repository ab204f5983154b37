use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use ingenierin_backend::core::config::{ConfigService, Settings};
use ingenierin_backend::core::logging;
use ingenierin_backend::server;
use ingenierin_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_service = ConfigService::new();
    let config = config_service
        .resolve_from_env()
        .context("Failed to load configuration")?;
    let settings = Settings::from_value(&config).context("Invalid configuration")?;

    logging::init(&settings.logging).context("Failed to initialize logging")?;
    tracing::info!(
        config_path = %config_service.config_path().display(),
        environment = %settings.app.environment,
        "Configuration loaded"
    );
    tracing::debug!(
        "Resolved configuration: {}",
        config_service.redact_sensitive_values(&config)
    );

    let bind_addr = settings.server.bind_addr();
    let state = AppState::initialize(settings)?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
