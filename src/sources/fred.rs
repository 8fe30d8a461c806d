use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

const FRED_API_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// US M2 money stock, monthly, billions of dollars.
pub const M2_SERIES_ID: &str = "M2SL";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

/// FRED reports values as strings and uses "." for missing data.
#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

/// One dated value of a FRED series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

fn parse_observations(raw: Vec<RawObservation>) -> Vec<Observation> {
    let mut observations: Vec<Observation> = raw
        .into_iter()
        .filter_map(|o| {
            let date = NaiveDate::parse_from_str(&o.date, "%Y-%m-%d").ok()?;
            let value: f64 = o.value.trim().parse().ok()?;
            (value.is_finite() && value > 0.0).then_some(Observation { date, value })
        })
        .collect();
    observations.sort_by_key(|o| o.date);
    observations
}

/// Forward-fill observations onto `len` consecutive days starting at `first_day`.
///
/// Each day takes the latest observation dated on or before it; days before
/// the first observation take the first observation. `None` when there are no
/// observations at all.
pub fn forward_fill(
    observations: &[Observation],
    first_day: NaiveDate,
    len: usize,
) -> Option<Vec<f64>> {
    let first = observations.first()?;
    let mut next = 0;
    let mut current = first.value;

    let values = (0..len)
        .map(|offset| {
            let day = first_day + Duration::days(offset as i64);
            while next < observations.len() && observations[next].date <= day {
                current = observations[next].value;
                next += 1;
            }
            current
        })
        .collect();

    Some(values)
}

/// Client for the FRED observations API.
#[derive(Clone)]
pub struct FredClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FredClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, FRED_API_URL)
    }

    pub fn with_base_url(client: Client, api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Observations of `series_id` from `start` onwards, oldest first.
    ///
    /// Errors never carry the request URL, which holds the API key.
    pub async fn observations(
        &self,
        series_id: &str,
        start: NaiveDate,
    ) -> Result<Vec<Observation>> {
        debug!("Fetching FRED series {} from {}", series_id, start);

        let start = start.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApi(format!("FRED request failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("FRED API returned {} for {}", status, series_id);
            return Err(AppError::ExternalApi(format!("FRED API error: {}", status)));
        }

        let body: ObservationsResponse = response.json().await.map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse FRED response: {}", e.without_url()))
        })?;

        Ok(parse_observations(body.observations))
    }
}
