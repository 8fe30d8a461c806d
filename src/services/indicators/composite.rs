//! Composite verdict from the latest output of each indicator.

use chrono::{DateTime, Utc};

use super::{Indicator, LiquidityCorrelator, PeakDetector, TrendOscillator};
use crate::types::{
    AnalysisParams, AssetImpact, CompositeVerdict, IndicatorInfo, LiquidityPoint, MarketAnalysis,
    MarketSeries, OverallRisk, OverallSignal, PeakPoint, TrendPoint, TrendSignal,
};

/// Peak strength points per unit of risk score.
const RISK_SCALE: f64 = 20.0;

/// Run every indicator over `series` and aggregate the results.
pub fn analyze(series: &MarketSeries, params: &AnalysisParams) -> MarketAnalysis {
    let oscillator = TrendOscillator::new(params.trend_period);
    let detector = PeakDetector::new(params.peak_window);
    let correlator = LiquidityCorrelator::new(params.liquidity_lag_days);

    let trend = oscillator.calculate(series);
    let peaks = detector.calculate(series);
    let liquidity = correlator.calculate(series);
    let verdict = aggregate(&trend, &peaks, &liquidity, series.as_of);

    MarketAnalysis {
        indicators: vec![
            describe(&oscillator, trend.len()),
            describe(&detector, peaks.len()),
            describe(&correlator, liquidity.len()),
        ],
        trend,
        peaks,
        liquidity,
        verdict,
    }
}

fn describe<I: Indicator>(indicator: &I, points: usize) -> IndicatorInfo {
    IndicatorInfo {
        id: indicator.id().to_string(),
        name: indicator.name().to_string(),
        min_periods: indicator.min_periods(),
        points,
    }
}

/// Verdict from the last element of each sequence (empty sequences count as absent).
pub fn aggregate(
    trend: &[TrendPoint],
    peaks: &[PeakPoint],
    liquidity: &[LiquidityPoint],
    as_of: DateTime<Utc>,
) -> CompositeVerdict {
    verdict_from_latest(trend.last(), peaks.last(), liquidity.last(), as_of)
}

/// Verdict from individual latest points, any of which may be missing.
pub fn verdict_from_latest(
    trend: Option<&TrendPoint>,
    peak: Option<&PeakPoint>,
    liquidity: Option<&LiquidityPoint>,
    as_of: DateTime<Utc>,
) -> CompositeVerdict {
    let mut signal_score = match trend.map(|t| t.signal) {
        Some(TrendSignal::Bullish) => 2,
        Some(TrendSignal::Bearish) => -2,
        _ => 0,
    };
    if peak.is_some_and(|p| p.is_peak) {
        signal_score -= 1;
    }
    signal_score += match liquidity.map(|l| l.impact_on_asset) {
        Some(AssetImpact::Positive) => 1,
        Some(AssetImpact::Negative) => -1,
        _ => 0,
    };

    let risk_score = peak.map_or(0.0, |p| p.peak_strength / RISK_SCALE);
    let overall_signal = OverallSignal::from_score(signal_score);

    CompositeVerdict {
        trend: trend.cloned(),
        peak: peak.cloned(),
        liquidity: liquidity.cloned(),
        signal_score,
        risk_score,
        overall_signal,
        signal_label: overall_signal.label().to_string(),
        overall_risk: OverallRisk::from_score(risk_score),
        timestamp: as_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        IndicatorStatus, LiquiditySignal, PeakIndicators, PeakRisk, PeakSignals,
    };

    fn trend_point(signal: TrendSignal) -> TrendPoint {
        TrendPoint {
            primary: 100.0,
            secondary_fast: 101.0,
            secondary_slow: 95.0,
            confirmation: 102.0,
            signal,
            color: signal.color().to_string(),
            strength: 5.0,
            timestamp: Utc::now(),
        }
    }

    fn peak_point(strength: f64) -> PeakPoint {
        let safe = IndicatorStatus::Safe;
        PeakPoint {
            is_peak: strength > 60.0,
            peak_strength: strength,
            risk_level: PeakRisk::classify(0, 0, strength),
            indicators: PeakIndicators {
                price_deviation: 0.0,
                volume_spike: 0.0,
                rsi: 50.0,
                fear_greed: 50.0,
                pi_cycle: 0.5,
                puell_multiple: 1.0,
                mvrv_z_score: 0.0,
                nvt_ratio: 1.0,
                mayer_multiple: 1.0,
                rainbow_band: 1.0,
                whale_activity: 0.0,
                exchange_volume: 1.0,
                network_growth: 0.0,
                liquidity_ratio: 1.0,
            },
            signals: PeakSignals {
                pi_cycle: safe,
                puell_multiple: safe,
                mvrv_z_score: safe,
                nvt_ratio: safe,
                mayer_multiple: safe,
                rainbow_band: safe,
                whale_activity: safe,
                exchange_volume: safe,
                network_growth: safe,
                liquidity_ratio: safe,
            },
            timestamp: Utc::now(),
        }
    }

    fn liquidity_point(impact: AssetImpact) -> LiquidityPoint {
        LiquidityPoint {
            macro_value: 21_000.0,
            correlation: 0.8,
            lag_days: 90,
            liquidity_signal: LiquiditySignal::Expanding,
            impact_on_asset: impact,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_all_absent_is_neutral() {
        let verdict = verdict_from_latest(None, None, None, Utc::now());
        assert_eq!(verdict.signal_score, 0);
        assert_eq!(verdict.risk_score, 0.0);
        assert_eq!(verdict.overall_signal, OverallSignal::Neutral);
        assert_eq!(verdict.overall_risk, OverallRisk::Low);
    }

    #[test]
    fn test_every_presence_combination() {
        let trend = trend_point(TrendSignal::Bullish);
        let peak = peak_point(75.0);
        let liquidity = liquidity_point(AssetImpact::Positive);

        for mask in 0..8u8 {
            let t = (mask & 1 != 0).then_some(&trend);
            let p = (mask & 2 != 0).then_some(&peak);
            let l = (mask & 4 != 0).then_some(&liquidity);
            let verdict = verdict_from_latest(t, p, l, Utc::now());

            let expected = t.map_or(0, |_| 2) - p.map_or(0, |_| 1) + l.map_or(0, |_| 1);
            assert_eq!(verdict.signal_score, expected);
            assert_eq!(verdict.overall_signal, OverallSignal::from_score(expected));
            assert_eq!(verdict.trend.is_some(), t.is_some());
            assert_eq!(verdict.peak.is_some(), p.is_some());
            assert_eq!(verdict.liquidity.is_some(), l.is_some());
        }
    }

    #[test]
    fn test_strong_bullish() {
        let verdict = verdict_from_latest(
            Some(&trend_point(TrendSignal::Bullish)),
            Some(&peak_point(10.0)),
            Some(&liquidity_point(AssetImpact::Positive)),
            Utc::now(),
        );
        assert_eq!(verdict.signal_score, 3);
        assert_eq!(verdict.overall_signal, OverallSignal::StrongBullish);
        assert_eq!(verdict.signal_label, "Strong Bullish");
        assert_eq!(verdict.risk_score, 0.5);
        assert_eq!(verdict.overall_risk, OverallRisk::Low);
    }

    #[test]
    fn test_strong_bearish_with_active_peak() {
        let verdict = verdict_from_latest(
            Some(&trend_point(TrendSignal::Bearish)),
            Some(&peak_point(90.0)),
            Some(&liquidity_point(AssetImpact::Negative)),
            Utc::now(),
        );
        assert_eq!(verdict.signal_score, -4);
        assert_eq!(verdict.overall_signal, OverallSignal::StrongBearish);
        assert_eq!(verdict.risk_score, 4.5);
        assert_eq!(verdict.overall_risk, OverallRisk::VeryHigh);
    }

    #[test]
    fn test_risk_bands() {
        let risk = |strength: f64| {
            verdict_from_latest(None, Some(&peak_point(strength)), None, Utc::now()).overall_risk
        };
        assert_eq!(risk(100.0), OverallRisk::VeryHigh);
        assert_eq!(risk(80.0), OverallRisk::VeryHigh);
        assert_eq!(risk(65.0), OverallRisk::High);
        assert_eq!(risk(40.0), OverallRisk::Medium);
        assert_eq!(risk(20.0), OverallRisk::Low);
        assert_eq!(risk(0.0), OverallRisk::Low);
    }

    #[test]
    fn test_aggregate_reads_last_points() {
        let trend = vec![
            trend_point(TrendSignal::Bearish),
            trend_point(TrendSignal::Bullish),
        ];
        let verdict = aggregate(&trend, &[], &[], Utc::now());
        assert_eq!(verdict.signal_score, 2);
        assert_eq!(verdict.trend.unwrap().signal, TrendSignal::Bullish);
    }

    #[test]
    fn test_analyze_short_series_degrades_gracefully() {
        let series = MarketSeries::new("btc", vec![100.0; 10], vec![], Utc::now());
        let analysis = analyze(&series, &AnalysisParams::default());
        assert!(analysis.trend.is_empty());
        assert!(analysis.peaks.is_empty());
        assert!(analysis.liquidity.is_empty());
        assert_eq!(analysis.verdict.overall_signal, OverallSignal::Neutral);
        assert_eq!(analysis.verdict.signal_label, "Neutral");
        assert_eq!(analysis.verdict.timestamp, series.as_of);
    }

    #[test]
    fn test_analyze_describes_each_indicator() {
        let prices: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        let series = MarketSeries::new("btc", prices, vec![], Utc::now());
        let analysis = analyze(&series, &AnalysisParams::default());

        let ids: Vec<&str> = analysis.indicators.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["cto_line", "bull_peak", "liquidity"]);
        assert_eq!(analysis.indicators[1].name, "Bull Market Peak");
        assert_eq!(analysis.indicators[1].min_periods, 31);
        assert_eq!(analysis.indicators[2].min_periods, 121);

        assert_eq!(analysis.indicators[0].points, analysis.trend.len());
        assert_eq!(analysis.indicators[1].points, 170);
        assert_eq!(analysis.indicators[2].points, 80);
    }
}
