use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directional reading of the trend oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendSignal {
    /// Display colour token for this classification.
    pub fn color(&self) -> &'static str {
        match self {
            TrendSignal::Bullish => "#f59e0b",
            TrendSignal::Bearish => "#3b82f6",
            TrendSignal::Neutral => "#9ca3af",
        }
    }
}

/// One sample of the four-line trend oscillator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// SMMA at the base period.
    pub primary: f64,
    /// SMMA at 0.8x the base period.
    pub secondary_fast: f64,
    /// SMMA at 1.2x the base period.
    pub secondary_slow: f64,
    /// SMMA at 0.6x the base period.
    pub confirmation: f64,
    pub signal: TrendSignal,
    pub color: String,
    /// Spread between primary and slow line, percent (0-100).
    pub strength: f64,
    pub timestamp: DateTime<Utc>,
}

/// Traffic-light state of a single peak sub-indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorStatus {
    Safe,
    Warning,
    Danger,
}

/// Risk tier of a peak reading. Ordered from calm to extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakRisk {
    Low,
    Medium,
    High,
    Extreme,
}

impl PeakRisk {
    /// Tier from the danger/warning tallies and the aggregate peak strength.
    pub fn classify(danger_count: usize, warning_count: usize, peak_strength: f64) -> Self {
        if danger_count >= 5 || peak_strength > 85.0 {
            PeakRisk::Extreme
        } else if danger_count >= 3 || peak_strength > 70.0 {
            PeakRisk::High
        } else if danger_count >= 1 || warning_count >= 4 || peak_strength > 50.0 {
            PeakRisk::Medium
        } else {
            PeakRisk::Low
        }
    }
}

/// Raw readings behind a [`PeakPoint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakIndicators {
    /// Price vs trailing-window mean, percent.
    pub price_deviation: f64,
    /// Volume vs trailing-window mean, percent.
    pub volume_spike: f64,
    /// Wilder RSI over the trailing window.
    pub rsi: f64,
    /// Sentiment proxy, 0-100.
    pub fear_greed: f64,
    pub pi_cycle: f64,
    pub puell_multiple: f64,
    pub mvrv_z_score: f64,
    pub nvt_ratio: f64,
    pub mayer_multiple: f64,
    pub rainbow_band: f64,
    pub whale_activity: f64,
    pub exchange_volume: f64,
    pub network_growth: f64,
    pub liquidity_ratio: f64,
}

/// Classification of each of the ten sub-indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakSignals {
    pub pi_cycle: IndicatorStatus,
    pub puell_multiple: IndicatorStatus,
    pub mvrv_z_score: IndicatorStatus,
    pub nvt_ratio: IndicatorStatus,
    pub mayer_multiple: IndicatorStatus,
    pub rainbow_band: IndicatorStatus,
    pub whale_activity: IndicatorStatus,
    pub exchange_volume: IndicatorStatus,
    pub network_growth: IndicatorStatus,
    pub liquidity_ratio: IndicatorStatus,
}

impl PeakSignals {
    pub fn all(&self) -> [IndicatorStatus; 10] {
        [
            self.pi_cycle,
            self.puell_multiple,
            self.mvrv_z_score,
            self.nvt_ratio,
            self.mayer_multiple,
            self.rainbow_band,
            self.whale_activity,
            self.exchange_volume,
            self.network_growth,
            self.liquidity_ratio,
        ]
    }

    pub fn count(&self, status: IndicatorStatus) -> usize {
        self.all().iter().filter(|s| **s == status).count()
    }
}

/// One sliding-window evaluation of the peak detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakPoint {
    pub is_peak: bool,
    /// Aggregate score, 0-100.
    pub peak_strength: f64,
    pub risk_level: PeakRisk,
    pub indicators: PeakIndicators,
    pub signals: PeakSignals,
    pub timestamp: DateTime<Utc>,
}

/// Direction of the macro liquidity series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquiditySignal {
    Expanding,
    Contracting,
    Neutral,
}

/// Expected effect of liquidity conditions on the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetImpact {
    Positive,
    Negative,
    Neutral,
}

/// Lagged macro/price correlation at one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityPoint {
    pub macro_value: f64,
    /// Pearson coefficient in [-1, 1].
    pub correlation: f64,
    pub lag_days: usize,
    pub liquidity_signal: LiquiditySignal,
    pub impact_on_asset: AssetImpact,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_signal_colors_distinct() {
        let colors = [
            TrendSignal::Bullish.color(),
            TrendSignal::Bearish.color(),
            TrendSignal::Neutral.color(),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn test_peak_risk_ladder() {
        assert_eq!(PeakRisk::classify(0, 0, 0.0), PeakRisk::Low);
        assert_eq!(PeakRisk::classify(0, 4, 20.0), PeakRisk::Medium);
        assert_eq!(PeakRisk::classify(1, 0, 10.0), PeakRisk::Medium);
        assert_eq!(PeakRisk::classify(0, 0, 50.5), PeakRisk::Medium);
        assert_eq!(PeakRisk::classify(3, 0, 30.0), PeakRisk::High);
        assert_eq!(PeakRisk::classify(0, 0, 71.0), PeakRisk::High);
        assert_eq!(PeakRisk::classify(5, 0, 50.0), PeakRisk::Extreme);
        assert_eq!(PeakRisk::classify(0, 0, 86.0), PeakRisk::Extreme);
    }

    #[test]
    fn test_peak_risk_boundaries_are_strict() {
        assert_eq!(PeakRisk::classify(0, 0, 50.0), PeakRisk::Low);
        assert_eq!(PeakRisk::classify(0, 0, 70.0), PeakRisk::Medium);
        assert_eq!(PeakRisk::classify(0, 0, 85.0), PeakRisk::High);
    }

    #[test]
    fn test_peak_risk_never_drops_as_strength_rises() {
        for danger in 0..=10 {
            for warning in 0..=(10 - danger) {
                let mut previous = PeakRisk::Low;
                for step in 0..=200 {
                    let strength = step as f64 * 0.5;
                    let tier = PeakRisk::classify(danger, warning, strength);
                    assert!(tier >= previous, "tier dropped at {danger}/{warning}/{strength}");
                    previous = tier;
                }
            }
        }
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&PeakRisk::Extreme).unwrap(), "\"extreme\"");
        assert_eq!(serde_json::to_string(&IndicatorStatus::Warning).unwrap(), "\"warning\"");
        assert_eq!(
            serde_json::to_string(&LiquiditySignal::Contracting).unwrap(),
            "\"contracting\""
        );
        assert_eq!(serde_json::to_string(&AssetImpact::Positive).unwrap(), "\"positive\"");
    }
}
