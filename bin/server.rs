// Autopost Gateway - Web Server
// Classifier endpoints plus the /api reverse proxy to the posting backend

use anyhow::{Context, Result};
use autopost_gateway::server::{create_app, AppState};
use autopost_gateway::{Forwarder, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env();
    config.init_logging()?;

    tracing::info!("Starting autopost-gateway v{}", autopost_gateway::VERSION);

    let classifier = config.build_classifier()?;
    tracing::info!(
        rules = classifier.rule_summaries().len(),
        catalog = classifier.catalog().len(),
        "stock classifier loaded"
    );

    let forwarder = Forwarder::new(config.forwarder.clone())?;
    match config.forwarder.timeout {
        Some(timeout) => tracing::info!(
            upstream = %config.forwarder.upstream_origin,
            timeout_ms = timeout.as_millis() as u64,
            "proxying /api"
        ),
        None => tracing::info!(
            upstream = %config.forwarder.upstream_origin,
            "proxying /api without an upstream timeout"
        ),
    }

    let app = create_app(AppState::new(classifier, forwarder));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
    }
    tracing::info!("Shutting down...");
}
