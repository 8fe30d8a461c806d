//! Bull-market peak detector.
//!
//! Ten sub-indicators, each a simplified price/volume proxy for a well-known
//! cycle-top metric, are classified safe/warning/danger and folded into one
//! peak strength together with three context bonuses (price deviation,
//! momentum and sentiment).

use chrono::{DateTime, Duration, Utc};

use super::{mean, ratio_or, sample_time, smma, trailing, Indicator};
use crate::types::{
    volume_or_neutral, IndicatorStatus, MarketSeries, PeakIndicators, PeakPoint, PeakRisk,
    PeakSignals,
};

const RSI_PERIOD: usize = 14;
const PEAK_THRESHOLD: f64 = 60.0;

const DANGER_WEIGHT: f64 = 10.0;
const WARNING_WEIGHT: f64 = 5.0;

const DEVIATION_BONUS_ABOVE: f64 = 20.0;
const DEVIATION_BONUS: f64 = 15.0;
const RSI_BONUS_ABOVE: f64 = 80.0;
const RSI_BONUS: f64 = 10.0;
const SENTIMENT_BONUS_ABOVE: f64 = 80.0;
const SENTIMENT_BONUS: f64 = 10.0;

/// Cut-offs for one sub-indicator.
#[derive(Debug, Clone, Copy)]
struct Threshold {
    warning: f64,
    danger: f64,
    /// True when low readings are the dangerous ones.
    inverted: bool,
}

impl Threshold {
    const fn above(warning: f64, danger: f64) -> Self {
        Self {
            warning,
            danger,
            inverted: false,
        }
    }

    const fn below(warning: f64, danger: f64) -> Self {
        Self {
            warning,
            danger,
            inverted: true,
        }
    }

    fn classify(&self, value: f64) -> IndicatorStatus {
        let (danger, warning) = if self.inverted {
            (value <= self.danger, value <= self.warning)
        } else {
            (value >= self.danger, value >= self.warning)
        };

        if danger {
            IndicatorStatus::Danger
        } else if warning {
            IndicatorStatus::Warning
        } else {
            IndicatorStatus::Safe
        }
    }
}

const PI_CYCLE: Threshold = Threshold::above(0.9, 1.0);
const PUELL_MULTIPLE: Threshold = Threshold::above(2.0, 4.0);
const MVRV_Z_SCORE: Threshold = Threshold::above(1.5, 2.5);
const NVT_RATIO: Threshold = Threshold::above(1.5, 2.2);
const MAYER_MULTIPLE: Threshold = Threshold::above(1.8, 2.4);
const RAINBOW_BAND: Threshold = Threshold::above(1.5, 2.0);
const WHALE_ACTIVITY: Threshold = Threshold::above(15.0, 30.0);
const EXCHANGE_VOLUME: Threshold = Threshold::above(1.8, 2.5);
const NETWORK_GROWTH: Threshold = Threshold::above(150.0, 300.0);
const LIQUIDITY_RATIO: Threshold = Threshold::below(0.7, 0.5);

/// Multi-factor cycle-top detector over a sliding lookback window.
pub struct PeakDetector {
    window: usize,
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self { window: 30 }
    }
}

impl PeakDetector {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Evaluate every index `i >= window`. Missing volumes read as the neutral baseline.
    pub fn calculate_prices(
        &self,
        prices: &[f64],
        volumes: Option<&[f64]>,
        as_of: DateTime<Utc>,
    ) -> Vec<PeakPoint> {
        if self.window == 0 || prices.len() <= self.window {
            return Vec::new();
        }

        let volumes = volumes.unwrap_or(&[]);
        let volume_history: Vec<f64> = (0..prices.len())
            .map(|index| volume_or_neutral(volumes, index))
            .collect();

        (self.window..prices.len())
            .map(|index| {
                let timestamp = sample_time(as_of, prices.len(), index, Duration::days(1));
                self.evaluate(prices, &volume_history, index, timestamp)
            })
            .collect()
    }

    fn evaluate(
        &self,
        prices: &[f64],
        volumes: &[f64],
        index: usize,
        timestamp: DateTime<Utc>,
    ) -> PeakPoint {
        let history = &prices[..=index];
        let volume_history = &volumes[..=index];
        let price = prices[index];
        let volume = volumes[index];

        let reference = &prices[index - self.window..index];
        let reference_volume = &volumes[index - self.window..index];

        let price_deviation = percent_change(price, mean(reference));
        let volume_spike = percent_change(volume, mean(reference_volume));
        let rsi = rsi(&prices[index - self.window..=index]);
        let fear_greed = (50.0 + price_deviation * 2.0 + volume_spike * 0.1).clamp(0.0, 100.0);

        let indicators = PeakIndicators {
            price_deviation,
            volume_spike,
            rsi,
            fear_greed,
            pi_cycle: pi_cycle(history),
            puell_multiple: puell_multiple(history),
            mvrv_z_score: mvrv_z_score(history),
            nvt_ratio: nvt_ratio(history, volume_history),
            mayer_multiple: mayer_multiple(history),
            rainbow_band: rainbow_band(history),
            whale_activity: whale_activity(volume_history),
            exchange_volume: exchange_volume(volume_history),
            network_growth: network_growth(history),
            liquidity_ratio: liquidity_ratio(history, volume_history),
        };

        let signals = PeakSignals {
            pi_cycle: PI_CYCLE.classify(indicators.pi_cycle),
            puell_multiple: PUELL_MULTIPLE.classify(indicators.puell_multiple),
            mvrv_z_score: MVRV_Z_SCORE.classify(indicators.mvrv_z_score),
            nvt_ratio: NVT_RATIO.classify(indicators.nvt_ratio),
            mayer_multiple: MAYER_MULTIPLE.classify(indicators.mayer_multiple),
            rainbow_band: RAINBOW_BAND.classify(indicators.rainbow_band),
            whale_activity: WHALE_ACTIVITY.classify(indicators.whale_activity),
            exchange_volume: EXCHANGE_VOLUME.classify(indicators.exchange_volume),
            network_growth: NETWORK_GROWTH.classify(indicators.network_growth),
            liquidity_ratio: LIQUIDITY_RATIO.classify(indicators.liquidity_ratio),
        };

        let danger_count = signals.count(IndicatorStatus::Danger);
        let warning_count = signals.count(IndicatorStatus::Warning);
        let peak_strength = peak_strength(danger_count, warning_count, &indicators);

        PeakPoint {
            is_peak: peak_strength > PEAK_THRESHOLD,
            peak_strength,
            risk_level: PeakRisk::classify(danger_count, warning_count, peak_strength),
            indicators,
            signals,
            timestamp,
        }
    }
}

/// Weighted tally of classifications plus context bonuses, capped at 100.
fn peak_strength(danger_count: usize, warning_count: usize, indicators: &PeakIndicators) -> f64 {
    let mut score = danger_count as f64 * DANGER_WEIGHT + warning_count as f64 * WARNING_WEIGHT;
    if indicators.price_deviation > DEVIATION_BONUS_ABOVE {
        score += DEVIATION_BONUS;
    }
    if indicators.rsi > RSI_BONUS_ABOVE {
        score += RSI_BONUS;
    }
    if indicators.fear_greed > SENTIMENT_BONUS_ABOVE {
        score += SENTIMENT_BONUS;
    }
    score.min(100.0)
}

/// Percentage change of `value` over `base`; 0 when `base` is zero.
fn percent_change(value: f64, base: f64) -> f64 {
    ratio_or(value - base, base, 0.0) * 100.0
}

/// Wilder RSI over every price change in `prices`.
fn rsi(prices: &[f64]) -> f64 {
    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|pair| {
            let change = pair[1] - pair[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let (Some(avg_gain), Some(avg_loss)) = (
        smma(&gains, RSI_PERIOD).last().copied(),
        smma(&losses, RSI_PERIOD).last().copied(),
    ) else {
        return 50.0;
    };

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// 111-sample SMA against twice the 350-sample SMA.
fn pi_cycle(history: &[f64]) -> f64 {
    let short = mean(trailing(history, 111));
    let long = mean(trailing(history, 350));
    ratio_or(short, 2.0 * long, 0.5)
}

/// Price against its 365-sample average.
fn puell_multiple(history: &[f64]) -> f64 {
    let price = history[history.len() - 1];
    ratio_or(price, mean(trailing(history, 365)), 1.0)
}

/// Z-score of price within the trailing 200 samples.
fn mvrv_z_score(history: &[f64]) -> f64 {
    let window = trailing(history, 200);
    let price = history[history.len() - 1];
    let avg = mean(window);
    let variance = window.iter().map(|p| (p - avg).powi(2)).sum::<f64>() / window.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON * avg.abs() {
        return 0.0;
    }
    ratio_or(price - avg, std_dev, 0.0)
}

/// Price stretch over 180 samples against short-term volume turnover.
fn nvt_ratio(history: &[f64], volumes: &[f64]) -> f64 {
    let price = history[history.len() - 1];
    let price_stretch = ratio_or(price, mean(trailing(history, 180)), 1.0);
    let turnover = ratio_or(
        mean(trailing(volumes, 14)),
        mean(trailing(volumes, 180)),
        1.0,
    );
    ratio_or(price_stretch, turnover, 1.0)
}

/// Price against its 730-sample average.
fn mayer_multiple(history: &[f64]) -> f64 {
    let price = history[history.len() - 1];
    ratio_or(price, mean(trailing(history, 730)), 1.0)
}

/// Distance of price above a log-linear fit over the last 1000 samples, as a multiple.
fn rainbow_band(history: &[f64]) -> f64 {
    let window = trailing(history, 1000);
    if window.len() < 2 || window.iter().any(|p| *p <= 0.0) {
        return 1.0;
    }

    let n = window.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let logs: Vec<f64> = window.iter().map(|p| p.ln()).collect();
    let y_mean = mean(&logs);

    let (sxy, sxx) = logs
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = x as f64 - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });

    let slope = ratio_or(sxy, sxx, 0.0);
    let fitted = y_mean + slope * (n - 1.0 - x_mean);
    let band = (logs[logs.len() - 1] - fitted).exp();
    if band.is_finite() {
        band
    } else {
        1.0
    }
}

/// Share of the last 30 samples (percent) whose volume is over twice the 120-sample mean.
fn whale_activity(volumes: &[f64]) -> f64 {
    let baseline = mean(trailing(volumes, 120));
    if baseline == 0.0 {
        return 0.0;
    }
    let recent = trailing(volumes, 30);
    let heavy = recent.iter().filter(|v| **v > baseline * 2.0).count();
    heavy as f64 / recent.len() as f64 * 100.0
}

/// 7-sample mean volume against the 100-sample mean.
fn exchange_volume(volumes: &[f64]) -> f64 {
    ratio_or(mean(trailing(volumes, 7)), mean(trailing(volumes, 100)), 1.0)
}

/// Growth (percent) of the 30-sample average across the trailing 270 samples.
fn network_growth(history: &[f64]) -> f64 {
    let window = trailing(history, 270);
    let early = mean(&window[..window.len().min(30)]);
    let late = mean(trailing(window, 30));
    percent_change(late, early)
}

/// Volume depth over 250 samples relative to how stretched price is.
fn liquidity_ratio(history: &[f64], volumes: &[f64]) -> f64 {
    let price = history[history.len() - 1];
    let depth = ratio_or(mean(trailing(volumes, 30)), mean(trailing(volumes, 250)), 1.0);
    let stretch = ratio_or(price, mean(trailing(history, 250)), 1.0);
    ratio_or(depth, stretch, 1.0)
}

impl Indicator for PeakDetector {
    type Point = PeakPoint;

    fn id(&self) -> &str {
        "bull_peak"
    }

    fn name(&self) -> &str {
        "Bull Market Peak"
    }

    fn min_periods(&self) -> usize {
        self.window + 1
    }

    fn calculate(&self, series: &MarketSeries) -> Vec<PeakPoint> {
        self.calculate_prices(&series.prices, Some(series.volumes.as_slice()), series.as_of)
    }
}
