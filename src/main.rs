use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil::config::Config;
use vigil::AppState;

/// How often expired analyses are swept from the cache.
const CACHE_SWEEP_SECS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Starting Vigil on {}:{} ({:?} data, {} days of history)",
        config.host, config.port, config.data_source, config.history_days
    );
    if config.fred_api_key.is_none() {
        info!("FRED_API_KEY not set, liquidity analysis will use a synthetic macro series");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::from_config(config)?;

    let analysis = state.analysis.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CACHE_SWEEP_SECS));
        loop {
            interval.tick().await;
            let purged = analysis.purge_cache();
            if purged > 0 {
                debug!("Purged {} expired analyses", purged);
            }
        }
    });

    let app = vigil::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Vigil listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
