//! Market-regime analysis endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::types::{AnalysisOutcome, CompositeVerdict};
use crate::AppState;

/// Trailing points per component sequence when `tail` is omitted.
pub const DEFAULT_TAIL: usize = 30;
pub const MAX_TAIL: usize = 500;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub cached: bool,
}

impl<T> ApiResponse<T> {
    fn new(data: T, cached: bool) -> Self {
        Self {
            data,
            meta: ApiMeta { cached },
        }
    }
}

/// Query parameters for the analysis endpoint.
#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    /// Number of trailing points of each sequence to include.
    pub tail: Option<usize>,
}

impl AnalysisQuery {
    fn tail(&self) -> Result<usize> {
        match self.tail {
            None => Ok(DEFAULT_TAIL),
            Some(tail) if tail <= MAX_TAIL => Ok(tail),
            Some(tail) => Err(AppError::BadRequest(format!(
                "tail must be at most {}, got {}",
                MAX_TAIL, tail
            ))),
        }
    }
}

/// Create the analysis router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_analysis))
        .route("/:symbol/verdict", get(get_verdict))
}

/// Full analysis for a symbol: verdict plus the tail of every component sequence.
async fn get_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<AnalysisOutcome>>> {
    let tail = query.tail()?;
    let served = state.analysis.analyze_symbol(&symbol).await?;
    Ok(Json(ApiResponse::new(
        served.outcome.with_tail(tail),
        served.cached,
    )))
}

/// Composite verdict only.
async fn get_verdict(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<CompositeVerdict>>> {
    let served = state.analysis.analyze_symbol(&symbol).await?;
    Ok(Json(ApiResponse::new(
        served.outcome.report().verdict.clone(),
        served.cached,
    )))
}
