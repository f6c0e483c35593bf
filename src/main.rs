//! `sms-middleware` server binary.

use anyhow::{Context, Result};
use sms_middleware::{AppConfig, build_router, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.logging);

    tracing::info!(
        username = %config.once.username,
        password_configured = config.once.password_set(),
        port = config.server.port,
        "starting 1NCE SMS middleware"
    );
    if !config.once.password_set() {
        tracing::warn!("ONCEAPI_PASSWORD is not set; token requests will be rejected");
    }

    let app = build_router(&config).context("failed to build router")?;
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    tracing::info!("listening on http://{}", address);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
