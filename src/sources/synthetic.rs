use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::TAU;

use super::{normalize_symbol, DataSource};
use crate::error::Result;
use crate::services::indicators::fnv1a;
use crate::types::MarketSeries;

const DAILY_DRIFT: f64 = 0.0008;
const DAILY_NOISE: f64 = 0.035;
/// Amplitude and length (days) of the slow boom/bust cycle.
const CYCLE_AMPLITUDE: f64 = 0.006;
const CYCLE_DAYS: f64 = 210.0;
const BASE_VOLUME: f64 = 2.5e9;

/// Generated daily history, identical for identical `(symbol, days)`.
///
/// Used as the fallback whenever the live source fails, and as the primary
/// source when running offline.
#[derive(Debug, Clone, Default)]
pub struct SyntheticDataSource {
    anchor: Option<DateTime<Utc>>,
}

impl SyntheticDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the timestamp of the latest sample instead of using today.
    pub fn with_anchor(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor: Some(anchor),
        }
    }

    fn as_of(&self) -> DateTime<Utc> {
        self.anchor.unwrap_or_else(|| {
            let now = Utc::now();
            now.date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc())
                .unwrap_or(now)
        })
    }

    /// Prices and volumes for `symbol` over `days + 1` daily samples.
    pub fn generate(symbol: &str, days: u32) -> (Vec<f64>, Vec<f64>) {
        let seed = seed_from_symbol(symbol, days);
        let mut rng = StdRng::seed_from_u64(seed);

        let phase = rng.gen_range(0.0..TAU);
        let mut price = starting_price(seed);
        let count = days as usize + 1;

        let mut prices = Vec::with_capacity(count);
        let mut volumes = Vec::with_capacity(count);
        for day in 0..count {
            let cycle = CYCLE_AMPLITUDE * (TAU * day as f64 / CYCLE_DAYS + phase).sin();
            let shock = rng.gen_range(-DAILY_NOISE..DAILY_NOISE);
            let change = DAILY_DRIFT + cycle + shock;
            price = (price * (1.0 + change)).max(f64::MIN_POSITIVE);

            let activity = 1.0 + change.abs() * 20.0;
            let volume = BASE_VOLUME * rng.gen_range(0.6..1.4) * activity;

            prices.push(price);
            volumes.push(volume);
        }
        (prices, volumes)
    }
}

/// Deterministic starting price between 1 and 50,000.
fn starting_price(seed: u64) -> f64 {
    let exponent = (seed % 1000) as f64 / 1000.0 * 4.7;
    10f64.powf(exponent)
}

/// Hash of the lower-cased symbol and the day count.
fn seed_from_symbol(symbol: &str, days: u32) -> u64 {
    fnv1a(
        symbol
            .to_lowercase()
            .bytes()
            .chain(days.to_le_bytes())
            .map(u64::from),
    )
}

#[async_trait]
impl DataSource for SyntheticDataSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch(&self, symbol: &str, days: u32) -> Result<MarketSeries> {
        let symbol = normalize_symbol(symbol)?;
        let (prices, volumes) = Self::generate(&symbol, days);
        Ok(MarketSeries::new(&symbol, prices, volumes, self.as_of()))
    }
}
