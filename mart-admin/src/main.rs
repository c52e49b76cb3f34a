use dotenvy::dotenv;
use mart_admin::config::get_configuration;
use mart_admin::services::{BackendClient, JwtSessionProvider};
use mart_admin::startup::build_router;
use mart_admin::AppState;
use mart_core::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "mart-admin",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    // Reject bad policy tables before accepting traffic
    let gate = configuration.access.build_gate().map_err(|e| {
        tracing::error!(error = %e, "Invalid access configuration");
        anyhow::anyhow!("Invalid access configuration: {}", e)
    })?;

    let backend = Arc::new(BackendClient::new(&configuration.backend)?);
    let sessions = Arc::new(JwtSessionProvider::new(&configuration.auth.jwt_secret));
    let state = AppState::new(gate, sessions, backend.clone(), backend);

    let app = build_router(state, &configuration.server);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!(
        backend = %configuration.backend.url,
        "Starting mart-admin on {}", address
    );
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
