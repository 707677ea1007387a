//! Contracts service entry point.
//!
//! Loads configuration, opens the SQLite store (running migrations) and
//! serves the contracts REST API.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use contracts_service::api::{self, ApiState};
use contracts_service::config::Config;
use contracts_service::db;
use contracts_service::render::Renderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let pool = db::init_pool(&config.database_url).await?;

    let renderer = Arc::new(Renderer::new(config.renderer_config()));
    info!(
        "Writing documents to {} (logo: {})",
        config.pdf_dir.display(),
        renderer.config().logo_path().display()
    );

    let app = api::build_router(Arc::new(ApiState { pool, renderer }));

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
