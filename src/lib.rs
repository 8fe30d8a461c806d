//! Vigil - cryptocurrency market-regime analytics server

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{Config, DataSourceKind};
use services::AnalysisService;
use sources::{DataSource, LiveDataSource, SyntheticDataSource};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analysis: Arc<AnalysisService>,
}

impl AppState {
    /// Wire up data sources and the analysis service from configuration.
    pub fn from_config(config: Config) -> error::Result<Self> {
        let primary: Arc<dyn DataSource> = match config.data_source {
            DataSourceKind::Live => Arc::new(LiveDataSource::from_config(&config)?),
            DataSourceKind::Synthetic => Arc::new(SyntheticDataSource::new()),
        };
        Ok(Self::with_source(config, primary))
    }

    /// State whose primary source is `primary`; the fallback is always synthetic.
    pub fn with_source(config: Config, primary: Arc<dyn DataSource>) -> Self {
        let analysis = AnalysisService::new(
            primary,
            Arc::new(SyntheticDataSource::new()),
            config.params,
            config.history_days,
            config.cache_ttl,
        );
        Self {
            config: Arc::new(config),
            analysis: Arc::new(analysis),
        }
    }

    /// Offline state backed only by generated data.
    pub fn synthetic() -> Self {
        let config = Config {
            data_source: DataSourceKind::Synthetic,
            ..Config::default()
        };
        Self::with_source(config, Arc::new(SyntheticDataSource::new()))
    }
}

/// Full application router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
