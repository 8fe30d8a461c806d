use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Baseline volume substituted wherever a volume sample is missing.
pub const NEUTRAL_VOLUME: f64 = 1_000_000.0;

/// Raw market history handed from a data source to the indicator engine.
///
/// Prices are oldest first. Volumes share the price indexing but may be
/// shorter (or empty); missing entries read as [`NEUTRAL_VOLUME`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSeries {
    /// Asset symbol (upper case).
    pub symbol: String,
    /// Close prices, one per time step.
    pub prices: Vec<f64>,
    /// Traded volume per time step.
    pub volumes: Vec<f64>,
    /// Macro money-supply proxy aligned with `prices`, if one was fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macro_values: Option<Vec<f64>>,
    /// Time of the most recent sample. Output timestamps count back from here.
    pub as_of: DateTime<Utc>,
}

impl MarketSeries {
    pub fn new(symbol: &str, prices: Vec<f64>, volumes: Vec<f64>, as_of: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            prices,
            volumes,
            macro_values: None,
            as_of,
        }
    }

    pub fn with_macro_values(mut self, macro_values: Vec<f64>) -> Self {
        self.macro_values = Some(macro_values);
        self
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Volume lookup shared by the engine: absent samples read as [`NEUTRAL_VOLUME`].
pub fn volume_or_neutral(volumes: &[f64], index: usize) -> f64 {
    volumes.get(index).copied().unwrap_or(NEUTRAL_VOLUME)
}

/// Tunable periods for one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    /// Base SMMA period of the trend oscillator.
    pub trend_period: usize,
    /// Lookback window of the peak detector.
    pub peak_window: usize,
    /// Lag in days between the macro series and price.
    pub liquidity_lag_days: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            trend_period: 15,
            peak_window: 30,
            liquidity_lag_days: 90,
        }
    }
}
