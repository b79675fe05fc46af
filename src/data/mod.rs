// Market data collaborators
// Sources produce raw daily bars; this module validates, aligns and resamples them

pub mod align;
pub mod csv_source;
pub mod resample;
pub mod validator;
pub mod yahoo;

pub use align::align_with_index;
pub use csv_source::CsvDataSource;
pub use resample::{multi_period, resample, Period};
pub use validator::BarValidator;
pub use yahoo::YahooDataSource;

use crate::error::DataError;
use crate::models::{Bar, IndexedBar, MultiPeriodBars};
use chrono::NaiveDate;

/// Read-only provider of daily bars
#[allow(async_fn_in_trait)]
pub trait MarketDataSource {
    fn name(&self) -> &str;

    /// Daily bars for `symbol` between `start` and `end` inclusive, in any order
    async fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError>;
}

/// Fetch, trim to the range, sort and validate one instrument
///
/// An empty result is an error: nothing downstream can run without bars.
pub async fn fetch_daily<S: MarketDataSource>(
    source: &S,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Bar>, DataError> {
    let mut bars: Vec<Bar> = source
        .daily_bars(symbol, start, end)
        .await?
        .into_iter()
        .filter(|b| b.date >= start && b.date <= end)
        .collect();
    bars.sort_by_key(|b| b.date);

    if bars.is_empty() {
        return Err(DataError::EmptyResult {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }

    BarValidator::new().validate_series(&bars)?;

    tracing::info!(
        "Loaded {} daily bars for {} from {} ({} to {})",
        bars.len(),
        symbol,
        source.name(),
        start,
        end
    );

    Ok(bars)
}

/// Stock bars joined with the index close by date
pub async fn load_aligned<S: MarketDataSource>(
    source: &S,
    symbol: &str,
    index_symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<IndexedBar>, DataError> {
    let stock = fetch_daily(source, symbol, start, end).await?;
    let index = fetch_daily(source, index_symbol, start, end).await?;

    let aligned = align_with_index(&stock, &index);
    if aligned.is_empty() {
        return Err(DataError::EmptyResult {
            symbol: format!("{} aligned with {}", symbol, index_symbol),
            start,
            end,
        });
    }

    Ok(aligned)
}

/// Daily bars of one instrument with weekly and monthly aggregates
pub async fn load_multi_period<S: MarketDataSource>(
    source: &S,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MultiPeriodBars, DataError> {
    let daily = fetch_daily(source, symbol, start, end).await?;
    Ok(multi_period(daily))
}
