use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::types::AnalysisParams;

/// Where market history comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSourceKind {
    /// CoinGecko prices, plus FRED M2 when a key is configured.
    #[default]
    Live,
    /// Deterministic generated history; needs no network.
    Synthetic,
}

impl FromStr for DataSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(DataSourceKind::Live),
            "synthetic" | "demo" => Ok(DataSourceKind::Synthetic),
            other => Err(format!("unknown data source: {}", other)),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    pub data_source: DataSourceKind,
    /// CoinGecko API key (optional, for pro tier).
    pub coingecko_api_key: Option<String>,
    /// FRED API key. Without it the macro series is synthesized.
    pub fred_api_key: Option<String>,
    /// Days of daily history fetched per analysis.
    pub history_days: u32,
    /// How long an analysis stays cached. Zero disables caching.
    pub cache_ttl: Duration,
    /// Upstream HTTP request timeout.
    pub request_timeout: Duration,
    pub params: AnalysisParams,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = AnalysisParams::default();

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(3001),
            data_source: parsed(&lookup, "DATA_SOURCE").unwrap_or_default(),
            coingecko_api_key: non_empty("COINGECKO_API_KEY"),
            fred_api_key: non_empty("FRED_API_KEY"),
            history_days: parsed::<u32>(&lookup, "HISTORY_DAYS").filter(|d| *d > 0).unwrap_or(365),
            cache_ttl: Duration::from_secs(parsed(&lookup, "CACHE_TTL_SECS").unwrap_or(300)),
            request_timeout: Duration::from_millis(
                parsed(&lookup, "REQUEST_TIMEOUT_MS").unwrap_or(10_000),
            ),
            params: AnalysisParams {
                trend_period: parsed(&lookup, "TREND_PERIOD").unwrap_or(defaults.trend_period),
                peak_window: parsed(&lookup, "PEAK_WINDOW").unwrap_or(defaults.peak_window),
                liquidity_lag_days: parsed(&lookup, "LIQUIDITY_LAG_DAYS")
                    .unwrap_or(defaults.liquidity_lag_days),
            },
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.data_source, DataSourceKind::Live);
        assert!(config.coingecko_api_key.is_none());
        assert!(config.fred_api_key.is_none());
        assert_eq!(config.history_days, 365);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
        assert_eq!(config.params, AnalysisParams::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATA_SOURCE", "Synthetic"),
            ("FRED_API_KEY", "abc"),
            ("HISTORY_DAYS", "730"),
            ("CACHE_TTL_SECS", "0"),
            ("TREND_PERIOD", "20"),
            ("PEAK_WINDOW", "45"),
            ("LIQUIDITY_LAG_DAYS", "60"),
        ]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_source, DataSourceKind::Synthetic);
        assert_eq!(config.fred_api_key.as_deref(), Some("abc"));
        assert_eq!(config.history_days, 730);
        assert!(config.cache_ttl.is_zero());
        assert_eq!(config.params.trend_period, 20);
        assert_eq!(config.params.peak_window, 45);
        assert_eq!(config.params.liquidity_lag_days, 60);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("DATA_SOURCE", "carrier-pigeon"),
            ("HISTORY_DAYS", "0"),
            ("COINGECKO_API_KEY", "  "),
        ]);
        assert_eq!(config.port, 3001);
        assert_eq!(config.data_source, DataSourceKind::Live);
        assert_eq!(config.history_days, 365);
        assert!(config.coingecko_api_key.is_none());
    }

    #[test]
    fn test_data_source_parse() {
        assert_eq!("live".parse::<DataSourceKind>(), Ok(DataSourceKind::Live));
        assert_eq!(" DEMO ".parse::<DataSourceKind>(), Ok(DataSourceKind::Synthetic));
        assert!("other".parse::<DataSourceKind>().is_err());
    }
}
