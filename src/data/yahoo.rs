use super::MarketDataSource;
use crate::config::DataConfig;
use crate::error::DataError;
use crate::models::Bar;
use chrono::NaiveDate;
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;

type YahooRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Response from the v8 chart endpoint
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance chart API client with rate limiting and retries
///
/// Cloneable; clones share the rate limiter.
#[derive(Clone)]
pub struct YahooDataSource {
    client: Client,
    base_url: String,
    rate_limiter: Arc<YahooRateLimiter>,
    retry_delay: Duration,
}

impl YahooDataSource {
    pub fn new(base_url: impl Into<String>, requests_per_minute: u32) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) holding-enhancer")
            .build()?;

        let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn from_config(config: &DataConfig) -> Result<Self, DataError> {
        Self::new(config.yahoo_base_url.clone(), config.requests_per_minute)
    }

    /// Base delay of the exponential backoff (doubled on every retry)
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        // period2 is exclusive, so run to midnight after the end date
        let midnight = |date: NaiveDate| {
            date.and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp())
                .unwrap_or_default()
        };
        let start_ts = midnight(start);
        let end_ts = midnight(end.succ_opt().unwrap_or(end));
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, symbol, start_ts, end_ts
        )
    }

    /// Make a rate-limited API request with retry logic
    async fn make_request(&self, symbol: &str, url: &str) -> Result<reqwest::Response, DataError> {
        for attempt in 1..=MAX_RETRIES {
            self.rate_limiter.until_ready().await;
            let backoff = self.retry_delay * 2u32.pow(attempt - 1);

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound(symbol.to_string()));
                    }

                    if (status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
                        && attempt < MAX_RETRIES
                    {
                        tracing::warn!(
                            "Yahoo returned {} for {}, retrying in {:?} (attempt {}/{})",
                            status,
                            symbol,
                            backoff,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    // Other errors (4xx) or retries exhausted
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(DataError::Api {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::warn!(
                        "Network error: {}, retrying in {:?} (attempt {}/{})",
                        e,
                        backoff,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(DataError::Http(e)),
            }
        }

        Err(DataError::Parse(format!(
            "no response for {} after {} attempts",
            symbol, MAX_RETRIES
        )))
    }

    fn parse_chart(symbol: &str, response: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = match (response.chart.result, response.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound(symbol.to_string()))
            }
            (None, Some(err)) => {
                return Err(DataError::Parse(format!("{}: {}", err.code, err.description)))
            }
            (None, None) => {
                return Err(DataError::Parse("empty result with no error".to_string()))
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::Parse("result array is empty".to_string()))?;

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        let Some(timestamps) = data.timestamp else {
            // No trading days in the requested range
            return Ok(Vec::new());
        };
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::Parse("no quote data".to_string()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| DataError::Parse(format!("invalid timestamp: {}", ts)))?;

            let field = |values: &[Option<f64>]| values.get(i).copied().flatten();

            // Suspended days come back with null prices
            let (Some(open), Some(high), Some(low), Some(close)) = (
                field(&quote.open),
                field(&quote.high),
                field(&quote.low),
                field(&quote.close),
            ) else {
                continue;
            };

            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: field(&quote.volume).unwrap_or(0.0),
            });
        }

        Ok(bars)
    }
}

impl MarketDataSource for YahooDataSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let url = self.chart_url(symbol, start, end);
        tracing::debug!("Fetching {} from Yahoo: {}", symbol, url);

        let response = self.make_request(symbol, &url).await?;
        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("chart response for {}: {}", symbol, e)))?;

        Self::parse_chart(symbol, chart)
    }
}
