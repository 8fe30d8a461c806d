use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cache::Cache;
use super::indicators::analyze;
use crate::error::{AppError, Result};
use crate::sources::{normalize_symbol, DataSource};
use crate::types::{AnalysisOutcome, AnalysisParams, AnalysisReport, MarketSeries};

/// An outcome plus whether it came from the cache.
#[derive(Debug, Clone)]
pub struct ServedAnalysis {
    pub outcome: AnalysisOutcome,
    pub cached: bool,
}

/// Fetches history, runs the indicator engine and caches the result.
pub struct AnalysisService {
    primary: Arc<dyn DataSource>,
    fallback: Arc<dyn DataSource>,
    params: AnalysisParams,
    history_days: u32,
    cache: Cache<AnalysisOutcome>,
}

impl AnalysisService {
    pub fn new(
        primary: Arc<dyn DataSource>,
        fallback: Arc<dyn DataSource>,
        params: AnalysisParams,
        history_days: u32,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            params,
            history_days,
            cache: Cache::new(cache_ttl),
        }
    }

    pub fn primary_source(&self) -> &'static str {
        self.primary.name()
    }

    /// Analyse `symbol`, serving from cache when possible.
    ///
    /// When the primary source fails the fallback source is used and the
    /// outcome says why. Invalid and unknown symbols are reported as errors
    /// rather than papered over with generated data.
    pub async fn analyze_symbol(&self, symbol: &str) -> Result<ServedAnalysis> {
        let symbol = normalize_symbol(symbol)?;

        if let Some(outcome) = self.cache.get(&symbol) {
            debug!("Serving cached analysis for {}", symbol);
            return Ok(ServedAnalysis {
                outcome,
                cached: true,
            });
        }

        let outcome = match self.primary.fetch(&symbol, self.history_days).await {
            Ok(series) => {
                let outcome = AnalysisOutcome::Ok {
                    report: self.report(self.primary.name(), series),
                };
                self.cache.insert(&symbol, outcome.clone());
                outcome
            }
            Err(e @ (AppError::BadRequest(_) | AppError::NotFound(_))) => return Err(e),
            Err(e) => {
                warn!(
                    "{} source failed for {}, falling back to {}: {}",
                    self.primary.name(),
                    symbol,
                    self.fallback.name(),
                    e
                );
                let series = self.fallback.fetch(&symbol, self.history_days).await?;
                AnalysisOutcome::Fallback {
                    report: self.report(self.fallback.name(), series),
                    reason: e.to_string(),
                }
            }
        };

        Ok(ServedAnalysis {
            outcome,
            cached: false,
        })
    }

    fn report(&self, source: &str, series: MarketSeries) -> AnalysisReport {
        let analysis = analyze(&series, &self.params);
        info!(
            "Analysed {} from {}: {} samples, signal {:?}, risk {:?}",
            series.symbol,
            source,
            series.len(),
            analysis.verdict.overall_signal,
            analysis.verdict.overall_risk
        );
        AnalysisReport::new(&series.symbol, source, series.len(), analysis)
    }

    /// Drop expired cache entries.
    pub fn purge_cache(&self) -> usize {
        self.cache.purge_expired()
    }
}
