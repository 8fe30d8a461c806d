//! Four-line smoothed trend oscillator ("CTO line").

use chrono::{DateTime, Duration, Utc};

use super::{sample_time, smma, Indicator};
use crate::types::{MarketSeries, TrendPoint, TrendSignal};

/// Minimum strength (percent) before a directional signal is emitted.
const MIN_SIGNAL_STRENGTH: f64 = 2.0;

/// Trend oscillator built from four SMMA lines of the typical price.
///
/// Lines, relative to the base period `p`:
/// - primary at `p`
/// - secondary-fast at `0.8p`
/// - secondary-slow at `1.2p`
/// - confirmation at `0.6p`
///
/// A point is bullish when the fan opens upward (fast above primary above
/// slow), bearish when it opens downward, and only when the primary/slow
/// spread exceeds 2%.
pub struct TrendOscillator {
    period: usize,
}

impl Default for TrendOscillator {
    fn default() -> Self {
        Self { period: 15 }
    }
}

/// SMMA periods used by the four oscillator lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePeriods {
    pub primary: usize,
    pub secondary_fast: usize,
    pub secondary_slow: usize,
    pub confirmation: usize,
}

impl LinePeriods {
    fn longest(&self) -> usize {
        self.primary
            .max(self.secondary_fast)
            .max(self.secondary_slow)
            .max(self.confirmation)
    }
}

impl TrendOscillator {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Line periods derived from the base period (fractions floored).
    pub fn periods(&self) -> LinePeriods {
        LinePeriods {
            primary: self.period,
            secondary_fast: self.period * 8 / 10,
            secondary_slow: self.period * 12 / 10,
            confirmation: self.period * 6 / 10,
        }
    }

    /// Evaluate the oscillator over `prices`, stamping the latest point at `as_of`.
    pub fn calculate_prices(&self, prices: &[f64], as_of: DateTime<Utc>) -> Vec<TrendPoint> {
        let periods = self.periods();
        if periods.confirmation == 0 || prices.len() < self.min_periods() {
            return Vec::new();
        }

        let primary = smma(prices, periods.primary);
        let fast = smma(prices, periods.secondary_fast);
        let slow = smma(prices, periods.secondary_slow);
        let confirmation = smma(prices, periods.confirmation);

        // SMMA output k of period p belongs to sample k + p - 1.
        let at = |line: &[f64], period: usize, sample: usize| line[sample + 1 - period];

        (periods.longest() - 1..prices.len())
            .map(|sample| {
                let primary = at(&primary, periods.primary, sample);
                let secondary_fast = at(&fast, periods.secondary_fast, sample);
                let secondary_slow = at(&slow, periods.secondary_slow, sample);
                let (signal, strength) = classify(primary, secondary_fast, secondary_slow);

                TrendPoint {
                    primary,
                    secondary_fast,
                    secondary_slow,
                    confirmation: at(&confirmation, periods.confirmation, sample),
                    signal,
                    color: signal.color().to_string(),
                    strength,
                    timestamp: sample_time(as_of, prices.len(), sample, Duration::hours(1)),
                }
            })
            .collect()
    }
}

/// Classify one aligned set of line values, returning the signal and its strength.
fn classify(primary: f64, secondary_fast: f64, secondary_slow: f64) -> (TrendSignal, f64) {
    let strength = if secondary_slow == 0.0 {
        0.0
    } else {
        ((primary - secondary_slow).abs() / secondary_slow.abs() * 100.0).clamp(0.0, 100.0)
    };

    let ordering = if secondary_fast > primary && primary > secondary_slow {
        TrendSignal::Bullish
    } else if secondary_fast < primary && primary < secondary_slow {
        TrendSignal::Bearish
    } else {
        TrendSignal::Neutral
    };

    let signal = if strength > MIN_SIGNAL_STRENGTH {
        ordering
    } else {
        TrendSignal::Neutral
    };

    (signal, strength)
}

impl Indicator for TrendOscillator {
    type Point = TrendPoint;

    fn id(&self) -> &str {
        "cto_line"
    }

    fn name(&self) -> &str {
        "CTO Line"
    }

    fn min_periods(&self) -> usize {
        (self.period * 2).max(self.periods().longest())
    }

    fn calculate(&self, series: &MarketSeries) -> Vec<TrendPoint> {
        self.calculate_prices(&series.prices, series.as_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 * 1.01_f64.powi(i as i32)).collect()
    }

    fn falling(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 * 0.99_f64.powi(i as i32)).collect()
    }

    #[test]
    fn test_periods_floor() {
        let periods = TrendOscillator::default().periods();
        assert_eq!(periods.primary, 15);
        assert_eq!(periods.secondary_fast, 12);
        assert_eq!(periods.secondary_slow, 18);
        assert_eq!(periods.confirmation, 9);

        let periods = TrendOscillator::new(7).periods();
        assert_eq!(periods.secondary_fast, 5);
        assert_eq!(periods.secondary_slow, 8);
        assert_eq!(periods.confirmation, 4);
    }

    #[test]
    fn test_insufficient_data() {
        let oscillator = TrendOscillator::default();
        assert!(oscillator.calculate_prices(&rising(29), Utc::now()).is_empty());
        assert!(!oscillator.calculate_prices(&rising(30), Utc::now()).is_empty());
    }

    #[test]
    fn test_tiny_period_is_empty() {
        assert!(TrendOscillator::new(1).calculate_prices(&rising(50), Utc::now()).is_empty());
        assert!(TrendOscillator::new(0).calculate_prices(&rising(50), Utc::now()).is_empty());
    }

    #[test]
    fn test_point_count_follows_longest_line() {
        let points = TrendOscillator::default().calculate_prices(&rising(100), Utc::now());
        assert_eq!(points.len(), 100 - 18 + 1);
    }

    #[test]
    fn test_lines_are_aligned_on_sample() {
        let prices = rising(60);
        let points = TrendOscillator::default().calculate_prices(&prices, Utc::now());
        let last = points.last().unwrap();
        assert_eq!(last.primary, *smma(&prices, 15).last().unwrap());
        assert_eq!(last.secondary_fast, *smma(&prices, 12).last().unwrap());
        assert_eq!(last.secondary_slow, *smma(&prices, 18).last().unwrap());
        assert_eq!(last.confirmation, *smma(&prices, 9).last().unwrap());

        // First point sits at sample 17, where the slow line starts.
        let first = &points[0];
        assert_eq!(first.secondary_slow, smma(&prices, 18)[0]);
        assert_eq!(first.primary, smma(&prices, 15)[3]);
    }

    #[test]
    fn test_rising_prices_are_bullish() {
        let points = TrendOscillator::default().calculate_prices(&rising(300), Utc::now());
        let last = points.last().unwrap();
        assert_eq!(last.signal, TrendSignal::Bullish);
        assert!(last.strength > 2.0);
        assert_eq!(last.color, TrendSignal::Bullish.color());
    }

    #[test]
    fn test_falling_prices_are_bearish() {
        let points = TrendOscillator::default().calculate_prices(&falling(300), Utc::now());
        let last = points.last().unwrap();
        assert_eq!(last.signal, TrendSignal::Bearish);
        assert!(last.strength > 2.0);
        assert_eq!(last.color, TrendSignal::Bearish.color());
    }

    #[test]
    fn test_flat_prices_are_neutral() {
        let points = TrendOscillator::default().calculate_prices(&vec![250.0; 120], Utc::now());
        assert!(points.iter().all(|p| p.signal == TrendSignal::Neutral));
        assert!(points.iter().all(|p| p.strength < 1e-9));
    }

    #[test]
    fn test_weak_spread_forced_neutral() {
        // Fast > primary > slow, but only 1% apart.
        let (signal, strength) = classify(101.0, 102.0, 100.0);
        assert_eq!(signal, TrendSignal::Neutral);
        assert!((strength - 1.0).abs() < 1e-12);

        let (signal, _) = classify(103.0, 104.0, 100.0);
        assert_eq!(signal, TrendSignal::Bullish);
    }

    #[test]
    fn test_zero_slow_line_has_zero_strength() {
        let (signal, strength) = classify(5.0, 6.0, 0.0);
        assert_eq!(strength, 0.0);
        assert_eq!(signal, TrendSignal::Neutral);
    }

    #[test]
    fn test_deterministic() {
        let prices = rising(200);
        let as_of = Utc::now();
        let oscillator = TrendOscillator::default();
        assert_eq!(
            oscillator.calculate_prices(&prices, as_of),
            oscillator.calculate_prices(&prices, as_of)
        );
    }

    #[test]
    fn test_timestamps_step_back_hourly() {
        let as_of = Utc::now();
        let points = TrendOscillator::default().calculate_prices(&rising(40), as_of);
        assert_eq!(points.last().unwrap().timestamp, as_of);
        for pair in points.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
    }
}
