//! Tabular exports and console output of finished runs.
//!
//! Everything here consumes fully computed series; nothing feeds back into the
//! simulation.

use crate::backtest::{EnhancementReport, EnhancementRow, LedgerRow, RoundTripReport};
use crate::error::EnhancerError;
use crate::models::{Action, Prediction, Regime, SignalDirection};
use crate::strategy::SignalBar;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat per-bar view of regime features, bands and signal
#[derive(Debug, Clone, Serialize)]
pub struct SignalRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub index_close: f64,
    pub regime: Regime,
    pub ma_index: Option<f64>,
    pub volatility: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub signal: i8,
    pub position_fraction: f64,
}

impl From<&SignalBar> for SignalRecord {
    fn from(bar: &SignalBar) -> Self {
        let classified = &bar.classified;
        Self {
            date: classified.bar.bar.date,
            close: classified.bar.bar.close,
            index_close: classified.bar.index_close,
            regime: classified.regime,
            ma_index: classified.features.ma_index,
            volatility: classified.features.volatility,
            upper: bar.upper,
            lower: bar.lower,
            signal: bar.signal.direction.value(),
            position_fraction: bar.signal.position_fraction,
        }
    }
}

/// Flat view of a prediction for export
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub as_of: NaiveDate,
    pub month_trend: String,
    pub week_trend: String,
    pub day_trend: String,
    pub action: String,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
}

impl From<&Prediction> for PredictionRecord {
    fn from(p: &Prediction) -> Self {
        Self {
            as_of: p.as_of,
            month_trend: format!("{:?}", p.month_trend),
            week_trend: format!("{:?}", p.week_trend),
            day_trend: format!("{:?}", p.day_trend),
            action: p.action.to_string(),
            buy_price: p.buy_price,
            sell_price: p.sell_price,
        }
    }
}

/// Recommendation for the most recent bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub date: NaiveDate,
    pub close: f64,
    pub regime: Regime,
    pub position_fraction: f64,
    pub direction: SignalDirection,
    pub next_session: Option<Prediction>,
}

impl Advice {
    pub fn recommendation(&self) -> &'static str {
        match self.direction {
            SignalDirection::Sell => "SELL / REDUCE: close broke above the upper band, sell a slice and buy it back lower",
            SignalDirection::Buy => "BUY / REFILL: close broke below the lower band, buy back the slice sold earlier",
            SignalDirection::Hold => "HOLD: no round-trip signal, keep the position unchanged",
        }
    }

    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                 LATEST MARKET ANALYSIS                ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("  Date:                  {}", self.date);
        println!("  Close:                 {:.2}", self.close);
        println!("  Regime:                {}", self.regime);
        println!(
            "  Round-Trip Slice:      {:.0}%",
            self.position_fraction * 100.0
        );
        println!("  Advice:                {}", self.recommendation());

        if let Some(prediction) = &self.next_session {
            println!("\n🔮 NEXT SESSION");
            println!(
                "  Trends (M/W/D):        {:?} / {:?} / {:?}",
                prediction.month_trend, prediction.week_trend, prediction.day_trend
            );
            println!("  Action:                {}", prediction.action);
            if prediction.action != Action::Wait {
                if let (Some(buy), Some(sell)) = (prediction.buy_price, prediction.sell_price) {
                    println!("  Buy Price:             {:.2}", buy);
                    println!("  Sell Price:            {:.2}", sell);
                }
            }
        }
        println!();
    }
}

/// Advice for the last signal bar, if any
pub fn latest_advice(signals: &[SignalBar], next_session: Option<Prediction>) -> Option<Advice> {
    let last = signals.last()?;
    Some(Advice {
        date: last.classified.bar.bar.date,
        close: last.close(),
        regime: last.regime(),
        position_fraction: last.signal.position_fraction,
        direction: last.signal.direction,
        next_session,
    })
}

/// Key/value metrics of an enhancement run
pub fn enhancement_metrics(report: &EnhancementReport) -> BTreeMap<String, f64> {
    let mut map = report.metrics.to_map();
    map.insert("benchmark_return".to_string(), report.benchmark_return);
    map
}

/// Key/value metrics of a round-trip run
pub fn round_trip_metrics(report: &RoundTripReport) -> BTreeMap<String, f64> {
    let mut map = report.metrics.to_map();
    map.extend(report.summary.to_map());
    map
}

pub fn print_metrics(title: &str, metrics: &BTreeMap<String, f64>) {
    println!("\n--- {} ---", title);
    for (key, value) in metrics {
        println!("  {:<22} {:.4}", key, value);
    }
}

fn report_error(path: &Path, err: impl std::fmt::Display) -> EnhancerError {
    EnhancerError::Report(format!("{}: {}", path.display(), err))
}

/// Write any serializable records as CSV with a header row
pub fn write_csv<T: Serialize>(
    path: &Path,
    records: impl IntoIterator<Item = T>,
) -> crate::Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| report_error(path, e))?;
    for record in records {
        writer.serialize(record).map_err(|e| report_error(path, e))?;
    }
    writer.flush().map_err(|e| report_error(path, e))?;
    Ok(())
}

pub fn write_metrics_json(path: &Path, metrics: &BTreeMap<String, f64>) -> crate::Result<()> {
    let json = serde_json::to_string_pretty(metrics).map_err(|e| report_error(path, e))?;
    fs::write(path, json).map_err(|e| report_error(path, e))
}

fn ensure_dir(dir: &Path) -> crate::Result<()> {
    fs::create_dir_all(dir).map_err(|e| report_error(dir, e))
}

/// Write signals, the NAV series and metrics of an enhancement run into `dir`
pub fn export_enhancement(dir: &Path, report: &EnhancementReport) -> crate::Result<Vec<PathBuf>> {
    ensure_dir(dir)?;

    let signals = dir.join("signals.csv");
    write_csv(&signals, report.signals.iter().map(SignalRecord::from))?;

    let rows = dir.join("enhancement.csv");
    write_csv::<&EnhancementRow>(&rows, &report.rows)?;

    let metrics = dir.join("enhancement_metrics.json");
    write_metrics_json(&metrics, &enhancement_metrics(report))?;

    tracing::info!("Exported enhancement run to {}", dir.display());
    Ok(vec![signals, rows, metrics])
}

/// Write predictions, the ledger and metrics of a round-trip run into `dir`
pub fn export_round_trip(dir: &Path, report: &RoundTripReport) -> crate::Result<Vec<PathBuf>> {
    ensure_dir(dir)?;

    let predictions = dir.join("predictions.csv");
    write_csv(&predictions, report.predictions.iter().map(PredictionRecord::from))?;

    let ledger = dir.join("ledger.csv");
    write_csv::<&LedgerRow>(&ledger, report.ledger.rows())?;

    let metrics = dir.join("round_trip_metrics.json");
    write_metrics_json(&metrics, &round_trip_metrics(report))?;

    tracing::info!("Exported round-trip run to {}", dir.display());
    Ok(vec![predictions, ledger, metrics])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
    use crate::data::multi_period;

    #[test]
    fn test_latest_advice_uses_last_bar() {
        let bars = SyntheticDataGenerator::new(42).generate(MarketScenario::Sideways, 100);
        let signals = BacktestRunner::default().classify_and_signal(&bars);
        let last = bars.last().unwrap();

        let advice = latest_advice(&signals, Some(Prediction::wait(last.bar.date))).unwrap();

        assert_eq!(advice.date, last.bar.date);
        assert_eq!(advice.close, last.bar.close);
        assert_eq!(advice.direction, signals.last().unwrap().signal.direction);
        assert!(latest_advice(&[], None).is_none());
    }

    #[test]
    fn test_export_enhancement_files() {
        let bars = SyntheticDataGenerator::new(42).generate(MarketScenario::Volatile, 120);
        let report = BacktestRunner::default().run_enhancement(&bars).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let files = export_enhancement(dir.path(), &report).unwrap();

        assert_eq!(files.len(), 3);
        let mut reader = csv::Reader::from_path(&files[1]).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "date");
        assert!(headers.iter().any(|h| h == "strategy_nav"));
        assert_eq!(reader.records().count(), 120);

        let json = fs::read_to_string(&files[2]).unwrap();
        let metrics: BTreeMap<String, f64> = serde_json::from_str(&json).unwrap();
        assert!(metrics.contains_key("benchmark_return"));
        assert!(metrics.contains_key("sharpe_ratio"));
    }

    #[test]
    fn test_export_round_trip_ledger() {
        let bars = SyntheticDataGenerator::new(42).generate(MarketScenario::Uptrend, 80);
        let views = multi_period(bars.into_iter().map(|b| b.bar).collect());
        let report = BacktestRunner::default().run_round_trip(&views).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let files = export_round_trip(&dir.path().join("out"), &report).unwrap();

        let content = fs::read_to_string(&files[1]).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,close,trade_type,cash_delta,cash,shares_held,stock_value,total_value,benchmark_value"
        );
        assert_eq!(lines.count(), 79);

        let metrics = round_trip_metrics(&report);
        assert!(metrics.contains_key("alpha"));
        assert!(metrics.contains_key("fill_success_rate"));
    }
}
