use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::types::MarketSeries;

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
const COINGECKO_PRO_API_URL: &str = "https://pro-api.coingecko.com/api/v3";

/// Symbol to CoinGecko ID mapping.
pub const SYMBOL_TO_ID: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("bnb", "binancecoin"),
    ("sol", "solana"),
    ("xrp", "ripple"),
    ("doge", "dogecoin"),
    ("ada", "cardano"),
    ("avax", "avalanche-2"),
    ("dot", "polkadot"),
    ("link", "chainlink"),
    ("matic", "matic-network"),
    ("ltc", "litecoin"),
    ("trx", "tron"),
    ("atom", "cosmos"),
    ("uni", "uniswap"),
    ("xlm", "stellar"),
    ("bch", "bitcoin-cash"),
    ("near", "near"),
    ("apt", "aptos"),
];

/// CoinGecko ID for a ticker symbol, case-insensitive.
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    let symbol = symbol.trim().to_lowercase();
    SYMBOL_TO_ID
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, id)| *id)
}

/// `/coins/{id}/market_chart` response: `[[timestamp_ms, value], ...]` pairs.
#[derive(Debug, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<[f64; 2]>,
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>,
}

impl MarketChart {
    /// Convert to a series, dropping unusable price samples.
    ///
    /// Volumes stay index-aligned with the surviving prices; a missing or
    /// unusable volume becomes 0 so the engine falls back to its neutral
    /// volume logic.
    pub fn into_series(self, symbol: &str) -> Result<MarketSeries> {
        let mut prices = Vec::with_capacity(self.prices.len());
        let mut volumes = Vec::with_capacity(self.prices.len());
        let mut last_timestamp = None;
        let mut dropped = 0usize;

        for (i, [timestamp, price]) in self.prices.iter().copied().enumerate() {
            if !price.is_finite() || price <= 0.0 {
                dropped += 1;
                continue;
            }
            let volume = self
                .total_volumes
                .get(i)
                .map(|v| v[1])
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(0.0);

            prices.push(price);
            volumes.push(volume);
            last_timestamp = Some(timestamp);
        }

        if dropped > 0 {
            warn!("Dropped {} unusable CoinGecko prices for {}", dropped, symbol);
        }

        let as_of = last_timestamp
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            .ok_or_else(|| {
                AppError::ExternalApi(format!("CoinGecko returned no prices for {}", symbol))
            })?;

        Ok(MarketSeries::new(symbol, prices, volumes, as_of))
    }
}

/// CoinGecko REST client for daily history.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn base_url(&self) -> &str {
        if self.api_key.is_some() {
            COINGECKO_PRO_API_URL
        } else {
            COINGECKO_API_URL
        }
    }

    /// Daily prices and volumes for the last `days` days.
    pub async fn market_chart(&self, symbol: &str, days: u32) -> Result<MarketSeries> {
        let id = coin_id(symbol)
            .ok_or_else(|| AppError::NotFound(format!("Unknown symbol: {}", symbol)))?;

        let url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={}&interval=daily",
            self.base_url(),
            id,
            days
        );
        debug!("Fetching CoinGecko market chart: {} days for {}", days, id);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(ref key) = self.api_key {
            request = request.header("x-cg-pro-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("CoinGecko request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("CoinGecko API returned {}: {}", status, truncate(&text, 200));
            return Err(AppError::ExternalApi(format!("CoinGecko API error: {}", status)));
        }

        let chart: MarketChart = response.json().await.map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse CoinGecko response: {}", e))
        })?;

        chart.into_series(symbol)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
