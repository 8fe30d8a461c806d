//! Lagged correlation between a macro money-supply proxy and asset price.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{fnv1a, sample_time, Indicator};
use crate::types::{AssetImpact, LiquidityPoint, LiquiditySignal, MarketSeries};

/// Samples per correlation window.
pub const CORRELATION_WINDOW: usize = 30;

const EXPANDING_ABOVE_PCT: f64 = 1.0;
const CONTRACTING_BELOW_PCT: f64 = -0.5;
const IMPACT_CORRELATION: f64 = 0.3;

/// Starting level of the synthetic macro series (billions, M2-like).
const SYNTHETIC_MACRO_START: f64 = 21_000.0;
const SYNTHETIC_MACRO_DRIFT: f64 = 0.0002;
const SYNTHETIC_MACRO_NOISE: f64 = 0.002;

/// Correlates price against the macro series shifted back by `lag_days`.
pub struct LiquidityCorrelator {
    lag_days: usize,
}

impl Default for LiquidityCorrelator {
    fn default() -> Self {
        Self { lag_days: 90 }
    }
}

impl LiquidityCorrelator {
    pub fn new(lag_days: usize) -> Self {
        Self { lag_days }
    }

    /// Evaluate every index with a full lagged window.
    ///
    /// Without a macro series one is synthesized from a generator seeded by
    /// `prices`, so identical inputs always produce identical points.
    pub fn calculate_prices(
        &self,
        prices: &[f64],
        macro_values: Option<&[f64]>,
        as_of: DateTime<Utc>,
    ) -> Vec<LiquidityPoint> {
        let start = self.lag_days + CORRELATION_WINDOW;
        if prices.len() <= start {
            return Vec::new();
        }

        let synthetic;
        let macro_values = match macro_values {
            Some(values) => values,
            None => {
                synthetic = synthetic_macro_series(prices);
                synthetic.as_slice()
            }
        };

        (start..prices.len())
            .take_while(|index| index - self.lag_days <= macro_values.len())
            .map(|index| {
                let macro_end = index - self.lag_days;
                let macro_window = &macro_values[macro_end - CORRELATION_WINDOW..macro_end];
                let price_window = &prices[index - CORRELATION_WINDOW..index];

                let correlation = pearson(macro_window, price_window);
                let liquidity_signal = classify_growth(macro_window);

                LiquidityPoint {
                    macro_value: macro_window[macro_window.len() - 1],
                    correlation,
                    lag_days: self.lag_days,
                    liquidity_signal,
                    impact_on_asset: impact(correlation, liquidity_signal),
                    timestamp: sample_time(as_of, prices.len(), index, Duration::days(1)),
                }
            })
            .collect()
    }
}

/// Pearson correlation coefficient of two equal-length windows.
///
/// Returns 0 when either window is constant (or the inputs are unusable);
/// the result is clamped to [-1, 1].
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return 0.0;
    }

    // Divide by the largest magnitude so the sums below stay finite.
    let x = normalized(x);
    let y = normalized(y);

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(&y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = var_x.sqrt() * var_y.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    let correlation = covariance / denominator;
    if correlation.is_finite() {
        correlation.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

fn normalized(values: &[f64]) -> Vec<f64> {
    let scale = values.iter().fold(0.0_f64, |max, v| max.max(v.abs()));
    values.iter().map(|v| v / scale).collect()
}

/// Growth of the macro window from first to last sample, as a signal.
fn classify_growth(window: &[f64]) -> LiquiditySignal {
    let first = window[0];
    let last = window[window.len() - 1];
    let growth = if first == 0.0 {
        0.0
    } else {
        (last - first) / first * 100.0
    };

    if growth > EXPANDING_ABOVE_PCT {
        LiquiditySignal::Expanding
    } else if growth < CONTRACTING_BELOW_PCT {
        LiquiditySignal::Contracting
    } else {
        LiquiditySignal::Neutral
    }
}

fn impact(correlation: f64, signal: LiquiditySignal) -> AssetImpact {
    if correlation <= IMPACT_CORRELATION {
        return AssetImpact::Neutral;
    }
    match signal {
        LiquiditySignal::Expanding => AssetImpact::Positive,
        LiquiditySignal::Contracting => AssetImpact::Negative,
        LiquiditySignal::Neutral => AssetImpact::Neutral,
    }
}

/// Money-supply-like random walk, the same length as `prices`, seeded from them.
pub fn synthetic_macro_series(prices: &[f64]) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed_from_prices(prices));
    let mut level = SYNTHETIC_MACRO_START;
    (0..prices.len())
        .map(|_| {
            let step = SYNTHETIC_MACRO_DRIFT
                + rng.gen_range(-SYNTHETIC_MACRO_NOISE..SYNTHETIC_MACRO_NOISE);
            level *= 1.0 + step;
            level
        })
        .collect()
}

/// Hash of the length and bit patterns of the prices.
fn seed_from_prices(prices: &[f64]) -> u64 {
    fnv1a(std::iter::once(prices.len() as u64).chain(prices.iter().map(|p| p.to_bits())))
}

impl Indicator for LiquidityCorrelator {
    type Point = LiquidityPoint;

    fn id(&self) -> &str {
        "liquidity"
    }

    fn name(&self) -> &str {
        "Global Liquidity"
    }

    fn min_periods(&self) -> usize {
        self.lag_days + CORRELATION_WINDOW + 1
    }

    fn calculate(&self, series: &MarketSeries) -> Vec<LiquidityPoint> {
        self.calculate_prices(&series.prices, series.macro_values.as_deref(), series.as_of)
    }
}
