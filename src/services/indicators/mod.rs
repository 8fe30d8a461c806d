//! Market-regime indicator engine.
//!
//! Pure functions over price/volume history. Every component returns an
//! empty sequence when its input is too short; nothing here allocates shared
//! state or performs I/O.

pub mod composite;
pub mod liquidity;
pub mod peak;
pub mod smma;
pub mod trend;

pub use composite::{aggregate, analyze, verdict_from_latest};
pub use liquidity::{pearson, synthetic_macro_series, LiquidityCorrelator};
pub use peak::PeakDetector;
pub use smma::smma;
pub use trend::TrendOscillator;

use chrono::{DateTime, Duration, Utc};

use crate::types::MarketSeries;

/// Trait for the sequence-producing components of the engine.
pub trait Indicator: Send + Sync {
    /// Point type emitted per valid sample.
    type Point;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Minimum number of price samples before any point is produced.
    fn min_periods(&self) -> usize;

    /// Evaluate the indicator over a whole series, oldest point first.
    fn calculate(&self, series: &MarketSeries) -> Vec<Self::Point>;
}

/// Arithmetic mean, 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// The last `len` values (or all of them when fewer are available).
pub(crate) fn trailing(values: &[f64], len: usize) -> &[f64] {
    &values[values.len().saturating_sub(len)..]
}

/// `numerator / denominator`, or `fallback` when the result would not be finite.
pub(crate) fn ratio_or(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator == 0.0 {
        return fallback;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// 64-bit FNV-1a, one step per word. Seeds the deterministic generators.
pub(crate) fn fnv1a(words: impl IntoIterator<Item = u64>) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    words
        .into_iter()
        .fold(OFFSET, |hash, word| (hash ^ word).wrapping_mul(PRIME))
}

/// Synthetic timestamp of sample `index` in a series of `len` samples,
/// counting back from `as_of` by `step` per sample.
pub(crate) fn sample_time(
    as_of: DateTime<Utc>,
    len: usize,
    index: usize,
    step: Duration,
) -> DateTime<Utc> {
    let steps_back = len.saturating_sub(index + 1) as i32;
    as_of - step * steps_back
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn test_trailing_truncates_to_available() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(trailing(&values, 2), &[2.0, 3.0]);
        assert_eq!(trailing(&values, 10), &values);
        assert!(trailing(&values, 0).is_empty());
    }

    #[test]
    fn test_ratio_or_guards_zero_and_overflow() {
        assert_eq!(ratio_or(1.0, 0.0, 7.0), 7.0);
        assert_eq!(ratio_or(f64::MAX, 1e-300, 7.0), 7.0);
        assert_eq!(ratio_or(6.0, 3.0, 7.0), 2.0);
    }

    #[test]
    fn test_fnv1a() {
        // Reference value for the single byte "a".
        assert_eq!(fnv1a([b'a' as u64]), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a([]), 0xcbf2_9ce4_8422_2325);
        assert_ne!(fnv1a([1, 2]), fnv1a([2, 1]));
    }

    #[test]
    fn test_sample_time_counts_back_from_latest() {
        let as_of = Utc::now();
        assert_eq!(sample_time(as_of, 5, 4, Duration::hours(1)), as_of);
        assert_eq!(sample_time(as_of, 5, 0, Duration::hours(1)), as_of - Duration::hours(4));
        assert_eq!(sample_time(as_of, 5, 2, Duration::days(1)), as_of - Duration::days(2));
    }
}
