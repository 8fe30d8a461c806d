pub mod coingecko;
pub mod fred;
pub mod live;
pub mod synthetic;

pub use coingecko::CoinGeckoClient;
pub use fred::FredClient;
pub use live::LiveDataSource;
pub use synthetic::SyntheticDataSource;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::types::MarketSeries;

/// Anything that can produce daily market history for a symbol.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short identifier reported alongside every analysis.
    fn name(&self) -> &'static str;

    /// Fetch roughly `days` of daily history for `symbol`, oldest first.
    async fn fetch(&self, symbol: &str, days: u32) -> Result<MarketSeries>;
}

/// Longest accepted ticker symbol.
pub const MAX_SYMBOL_LEN: usize = 12;

/// Trim and lower-case a ticker, rejecting anything that is not 1-12 ASCII alphanumerics.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty()
        || symbol.len() > MAX_SYMBOL_LEN
        || !symbol.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(AppError::BadRequest(format!("Invalid symbol: {:?}", symbol)));
    }
    Ok(symbol.to_lowercase())
}
