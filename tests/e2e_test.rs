use chrono::NaiveDate;
use holding_enhancer::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
use holding_enhancer::data::{self, CsvDataSource};
use holding_enhancer::models::{Action, Bar, TradeType};
use holding_enhancer::report;
use holding_enhancer::*;

const SYMBOL: &str = "600519.SS";
const INDEX: &str = "000300.SS";

/// Write a synthetic stock series and its index into `dir` as CSV files
fn write_fixture(dir: &std::path::Path, scenario: MarketScenario, n: usize) {
    let bars = SyntheticDataGenerator::new(42).generate(scenario, n);

    let stock: Vec<Bar> = bars.iter().map(|b| b.bar).collect();
    let index: Vec<Bar> = bars
        .iter()
        .map(|b| Bar {
            date: b.bar.date,
            open: b.index_close,
            high: b.index_close,
            low: b.index_close,
            close: b.index_close,
            volume: 0.0,
        })
        .collect();

    CsvDataSource::write(&dir.join(format!("{}.csv", SYMBOL)), &stock).unwrap();
    // Drop one index day so alignment has something to remove
    CsvDataSource::write(&dir.join(format!("{}.csv", INDEX)), &index[1..]).unwrap();
}

fn range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2021, 12, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
    )
}

#[tokio::test]
async fn test_e2e_workflow() {
    let _ = tracing_subscriber::fmt::try_init();

    println!("=== Starting E2E Test ===\n");

    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), MarketScenario::Uptrend, 520);
    let source = CsvDataSource::new(dir.path());
    let (start, end) = range();

    // 1. Load aligned bars
    println!("1. Loading aligned bars...");
    let aligned = data::load_aligned(&source, SYMBOL, INDEX, start, end)
        .await
        .unwrap();
    assert_eq!(aligned.len(), 519);
    println!("   ✓ {} bars aligned with the index", aligned.len());

    // 2. Stochastic enhancement backtest
    println!("\n2. Running enhancement backtest...");
    let runner = BacktestRunner::new(EnhancerConfig::default());
    let enhancement = runner.run_enhancement(&aligned).unwrap();
    assert_eq!(enhancement.rows.len(), aligned.len());
    assert_eq!(enhancement.rows[0].strategy_nav, 1.0);
    assert_eq!(enhancement.rows[0].enhancement_return, 0.0);
    println!(
        "   ✓ Strategy {:+.2}% vs benchmark {:+.2}%",
        enhancement.metrics.total_return * 100.0,
        enhancement.benchmark_return * 100.0
    );

    // 3. Deterministic round-trip backtest
    println!("\n3. Running round-trip backtest...");
    let views = data::load_multi_period(&source, SYMBOL, start, end)
        .await
        .unwrap();
    let round_trip = runner.run_round_trip(&views).unwrap();
    let rows = round_trip.ledger.rows();
    assert_eq!(rows.len(), views.daily.len() - 1);
    assert!(rows.iter().all(|r| r.shares_held == 100));

    // Cash only moves on trade days
    for row in rows {
        if row.trade_type == TradeType::NoTrade {
            assert_eq!(row.cash_delta, 0.0);
        }
    }
    // A Wait prediction is never traded
    for (prediction, row) in round_trip.predictions.iter().zip(rows) {
        if prediction.action == Action::Wait {
            assert_eq!(row.trade_type, TradeType::NoTrade);
        }
    }
    println!(
        "   ✓ {} trade days, alpha {:+.2}%",
        round_trip.summary.trade_days,
        round_trip.summary.alpha * 100.0
    );

    // 4. Export
    println!("\n4. Exporting reports...");
    let out = dir.path().join("out");
    let files = report::export_round_trip(&out, &round_trip).unwrap();
    for file in &files {
        assert!(file.exists(), "missing {}", file.display());
    }
    let files = report::export_enhancement(&out, &enhancement).unwrap();
    for file in &files {
        assert!(file.exists(), "missing {}", file.display());
    }

    println!("\n=== E2E Test Complete ===");
}

#[tokio::test]
async fn test_missing_symbol_aborts_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), MarketScenario::Sideways, 50);
    let source = CsvDataSource::new(dir.path());
    let (start, end) = range();

    let err = data::load_aligned(&source, SYMBOL, "399001.SZ", start, end)
        .await
        .unwrap_err();

    assert!(matches!(err, DataError::SymbolNotFound(_)));
    assert!(err.to_string().contains("399001.SZ"));
}

#[tokio::test]
async fn test_range_without_bars_is_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), MarketScenario::Sideways, 50);
    let source = CsvDataSource::new(dir.path());

    let err = data::load_multi_period(
        &source,
        SYMBOL,
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DataError::EmptyResult { .. }));
}
