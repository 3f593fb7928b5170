use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use plant_disease_detector::{AppState, app, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("plant_disease_detector=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!(
        "Using model {} at {} (translation: {})",
        config.model,
        config.base_url,
        config.translation_language.as_deref().unwrap_or("off")
    );

    let bind_addr = config.bind_addr;
    let state = AppState::new(config)?;
    let request_counter = state.request_counter.clone();

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    request_counter.print_summary();
    Ok(())
}
