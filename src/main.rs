use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use oficina::civil_time::SystemClock;
use oficina::config::AppConfig;
use oficina::handlers;
use oficina::repository;
use oficina::services::scheduling::ScheduleService;
use oficina::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let repo = repository::connect(&config)?;

    let state = Arc::new(AppState {
        schedules: ScheduleService::new(Arc::clone(&repo), Arc::new(SystemClock)),
        config: config.clone(),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, closing schedule store");
    repo.close().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
