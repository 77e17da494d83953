//! # Vertigo Server
//!
//! Loads configuration and site settings, wires the adapters into the
//! services and runs the background workers until interrupted.

mod config;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Must precede config loading, which logs warnings.
    telemetry::init_telemetry(&TelemetryConfig::from_env());
    let config = AppConfig::from_env();

    let state = AppState::build(&config).await?;
    state.start_workers().await?;

    let site = state.settings.current().await;
    if site.first_run {
        tracing::warn!(
            path = %config.settings_path.display(),
            "Site is not installed yet; complete the installation to configure it"
        );
    } else {
        tracing::info!(site = %site.name, hostname = %site.hostname, "Site settings loaded");
    }

    match state.posts.list_authors().await {
        Ok(authors) => tracing::info!(
            authors = authors.len(),
            published = authors.iter().map(|a| a.posts.len()).sum::<usize>(),
            "Storage ready"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not list authors"),
    }

    tracing::info!("Vertigo is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let stats = state.jobs.stats().await?;
    tracing::info!(
        scheduled = stats.scheduled,
        pending = stats.pending,
        completed = stats.completed,
        failed = stats.failed,
        "Shutting down"
    );

    Ok(())
}
