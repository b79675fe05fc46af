use super::MarketDataSource;
use crate::error::DataError;
use crate::models::Bar;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Daily bars from `<dir>/<symbol>.csv`
///
/// Expected header: `date,open,high,low,close,volume`, dates as `YYYY-MM-DD`.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
}

impl CsvDataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Parse bars from CSV text
    pub fn parse(content: &[u8]) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content);

        let mut bars = Vec::new();
        for record in reader.deserialize() {
            let bar: Bar = record?;
            bars.push(bar);
        }
        Ok(bars)
    }

    /// Write bars in the format `parse` reads
    pub fn write(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
        let mut writer = csv::Writer::from_path(path)?;
        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl MarketDataSource for CsvDataSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(symbol);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::SymbolNotFound(format!(
                    "{} (no file at {})",
                    symbol,
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let bars: Vec<Bar> = Self::parse(&content)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        tracing::debug!("Read {} bars for {} from {}", bars.len(), symbol, path.display());
        Ok(bars)
    }
}
