use crate::types::AnalysisParams;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    data_source: &'static str,
    history_days: u32,
    cache_ttl_secs: u64,
    params: AnalysisParams,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        data_source: state.analysis.primary_source(),
        history_days: state.config.history_days,
        cache_ttl_secs: state.config.cache_ttl.as_secs(),
        params: state.config.params,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
