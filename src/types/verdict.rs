use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LiquidityPoint, PeakPoint, TrendPoint};

/// Five-level directional verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSignal {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl OverallSignal {
    /// Map an integer signal score onto the five levels.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 3 => OverallSignal::StrongBullish,
            s if s >= 1 => OverallSignal::Bullish,
            s if s <= -3 => OverallSignal::StrongBearish,
            s if s <= -1 => OverallSignal::Bearish,
            _ => OverallSignal::Neutral,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OverallSignal::StrongBullish => "Strong Bullish",
            OverallSignal::Bullish => "Bullish",
            OverallSignal::Neutral => "Neutral",
            OverallSignal::Bearish => "Bearish",
            OverallSignal::StrongBearish => "Strong Bearish",
        }
    }
}

/// Five-level risk verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallRisk {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl OverallRisk {
    /// Map a risk score (peak strength / 20) onto the five levels.
    ///
    /// The ladder is evaluated top to bottom; `Low` is tested before
    /// `VeryLow`, so every score at or below 1 lands on `Low`.
    pub fn from_score(score: f64) -> Self {
        if score >= 4.0 {
            OverallRisk::VeryHigh
        } else if score >= 3.0 {
            OverallRisk::High
        } else if score <= 1.0 {
            OverallRisk::Low
        } else if score <= 0.5 {
            OverallRisk::VeryLow
        } else {
            OverallRisk::Medium
        }
    }
}

/// Single verdict built from the latest point of each component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeVerdict {
    pub trend: Option<TrendPoint>,
    pub peak: Option<PeakPoint>,
    pub liquidity: Option<LiquidityPoint>,
    pub signal_score: i32,
    pub risk_score: f64,
    pub overall_signal: OverallSignal,
    /// Display form of `overall_signal`.
    pub signal_label: String,
    pub overall_risk: OverallRisk,
    pub timestamp: DateTime<Utc>,
}

/// What one indicator is and how much of the series it covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorInfo {
    pub id: String,
    pub name: String,
    /// Samples needed before the first point.
    pub min_periods: usize,
    /// Points produced over the full series.
    pub points: usize,
}

/// Full engine output for one market series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub indicators: Vec<IndicatorInfo>,
    pub trend: Vec<TrendPoint>,
    pub peaks: Vec<PeakPoint>,
    pub liquidity: Vec<LiquidityPoint>,
    pub verdict: CompositeVerdict,
}

/// Renderable analysis for a symbol, with optionally truncated sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub symbol: String,
    /// Data source that produced the series.
    pub source: String,
    /// Number of price samples analysed.
    pub samples: usize,
    pub indicators: Vec<IndicatorInfo>,
    pub verdict: CompositeVerdict,
    pub trend: Vec<TrendPoint>,
    pub peaks: Vec<PeakPoint>,
    pub liquidity: Vec<LiquidityPoint>,
}

impl AnalysisReport {
    pub fn new(symbol: &str, source: &str, samples: usize, analysis: MarketAnalysis) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            source: source.to_string(),
            samples,
            indicators: analysis.indicators,
            verdict: analysis.verdict,
            trend: analysis.trend,
            peaks: analysis.peaks,
            liquidity: analysis.liquidity,
        }
    }

    /// Keep only the last `tail` points of each component sequence.
    pub fn truncated(&self, tail: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            source: self.source.clone(),
            samples: self.samples,
            indicators: self.indicators.clone(),
            verdict: self.verdict.clone(),
            trend: last_n(&self.trend, tail),
            peaks: last_n(&self.peaks, tail),
            liquidity: last_n(&self.liquidity, tail),
        }
    }
}

fn last_n<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

/// Result of analysing a symbol. Always carries a renderable report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Analysis ran on the requested data source.
    Ok { report: AnalysisReport },
    /// The requested source failed; the report comes from the fallback source.
    Fallback {
        report: AnalysisReport,
        reason: String,
    },
}

impl AnalysisOutcome {
    pub fn report(&self) -> &AnalysisReport {
        match self {
            AnalysisOutcome::Ok { report } | AnalysisOutcome::Fallback { report, .. } => report,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalysisOutcome::Fallback { .. })
    }

    pub fn with_tail(&self, tail: usize) -> Self {
        match self {
            AnalysisOutcome::Ok { report } => AnalysisOutcome::Ok {
                report: report.truncated(tail),
            },
            AnalysisOutcome::Fallback { report, reason } => AnalysisOutcome::Fallback {
                report: report.truncated(tail),
                reason: reason.clone(),
            },
        }
    }
}
