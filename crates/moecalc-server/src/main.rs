mod app;
mod dto;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use state::{AppState, ServerSettings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let settings = ServerSettings::from_env();
    let addr = settings.addr();
    info!("Default precision: {}", settings.default_precision);

    let app = app::router(Arc::new(AppState::new(settings)));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
