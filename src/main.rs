//! Trailcam - a client adapter for SPYPOINT cellular trail cameras.
//!
//! # API Endpoints
//!
//! - `GET /api/cameras` - List cameras (cached briefly)
//! - `GET /api/photos?limit=&tags=` - List recent photos, newest first
//! - `GET /health` - Health check

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use trailcam::api::{AppState, router};
use trailcam::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("trailcam=info".parse()?))
        .init();

    // Credentials are never logged
    let config = Config::from_env()?;

    info!(
        port = config.port,
        api_url = config.api_url.as_deref().unwrap_or("default"),
        camera_cache_secs = config.camera_cache_ttl.as_secs(),
        "Starting Trailcam server"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Trailcam is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
