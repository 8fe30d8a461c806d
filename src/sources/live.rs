use async_trait::async_trait;
use chrono::Duration;
use reqwest::Client;
use tracing::{debug, warn};

use super::coingecko::CoinGeckoClient;
use super::fred::{forward_fill, FredClient, M2_SERIES_ID};
use super::DataSource;
use crate::config::Config;
use crate::error::Result;
use crate::types::MarketSeries;

/// CoinGecko history, with FRED M2 as the macro series when available.
///
/// A FRED failure is not fatal: the series goes out without macro values and
/// the liquidity correlator synthesizes its own.
pub struct LiveDataSource {
    coingecko: CoinGeckoClient,
    fred: Option<FredClient>,
}

impl LiveDataSource {
    pub fn new(coingecko: CoinGeckoClient, fred: Option<FredClient>) -> Self {
        Self { coingecko, fred }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(
                "Vigil/",
                env!("CARGO_PKG_VERSION"),
                " (market regime analytics)"
            ))
            .build()?;

        let coingecko = CoinGeckoClient::new(client.clone(), config.coingecko_api_key.clone());
        let fred = config
            .fred_api_key
            .clone()
            .map(|key| FredClient::new(client, key));

        Ok(Self::new(coingecko, fred))
    }

    async fn attach_macro(&self, series: MarketSeries) -> MarketSeries {
        let Some(fred) = &self.fred else {
            return series;
        };
        if series.is_empty() {
            return series;
        }

        let first_day = (series.as_of - Duration::days(series.len() as i64 - 1)).date_naive();
        // Monthly series: start a couple of months early so the first days have a value.
        let start = first_day - Duration::days(62);

        match fred.observations(M2_SERIES_ID, start).await {
            Ok(observations) => match forward_fill(&observations, first_day, series.len()) {
                Some(values) => {
                    debug!("Aligned {} M2 observations for {}", observations.len(), series.symbol);
                    series.with_macro_values(values)
                }
                None => {
                    warn!("FRED returned no M2 observations, macro series will be synthesized");
                    series
                }
            },
            Err(e) => {
                warn!("FRED fetch failed, macro series will be synthesized: {}", e);
                series
            }
        }
    }
}

#[async_trait]
impl DataSource for LiveDataSource {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn fetch(&self, symbol: &str, days: u32) -> Result<MarketSeries> {
        let series = self.coingecko.market_chart(symbol, days).await?;
        Ok(self.attach_macro(series).await)
    }
}
