//! geotrace — Binary Entrypoint
//! Loads configuration, boots the session and serves the map API with Axum.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use geotrace::config::AppConfig;
use geotrace::metrics::Metrics;

/// Compact logs, filtered by `RUST_LOG` (default `geotrace=info,warn`).
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geotrace=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load_default().context("loading configuration")?;
    let metrics = Metrics::init().context("installing metrics recorder")?;

    let app = geotrace::app(&config).await.merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(bind = %config.server.bind, "geotrace listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serving")?;
    Ok(())
}
