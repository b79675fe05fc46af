use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by market data collaborators
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data source returned no bars for {symbol} between {start} and {end}")]
    EmptyResult {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market data API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("unexpected response format: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bar on {date}: {reason}")]
    InvalidBar { date: NaiveDate, reason: String },
}

/// Errors surfaced by the analytics and simulation pipeline
#[derive(Debug, Error)]
pub enum EnhancerError {
    /// A series handed to the predictor reaches past the prediction date.
    #[error("look-ahead: {series} series ends on {last}, after prediction date {as_of}")]
    LookAhead {
        series: &'static str,
        last: NaiveDate,
        as_of: NaiveDate,
    },

    #[error("not enough data: need {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("predictions ({predictions}) do not line up with bars ({bars})")]
    MisalignedPredictions { predictions: usize, bars: usize },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to write report: {0}")]
    Report(String),
}
