//! Holding enhancer CLI.
//!
//! # Latest regime, signal and next-session prediction
//! holding-enhancer advice --symbol 600519.SS
//!
//! # Stochastic enhancement-yield backtest with CSV export
//! holding-enhancer enhance --days 730 --output results
//!
//! # Deterministic multi-timeframe round-trip backtest on synthetic data
//! holding-enhancer --source synthetic --scenario volatile round-trip

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use holding_enhancer::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
use holding_enhancer::config::{DataSourceKind, EnhancerConfig};
use holding_enhancer::data::{self, CsvDataSource, MarketDataSource, YahooDataSource};
use holding_enhancer::models::{IndexedBar, MultiPeriodBars};
use holding_enhancer::report;
use holding_enhancer::strategy::DirectionalPredictor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "holding-enhancer")]
#[command(about = "Regime-aware round-trip trading on top of a long-term stock holding")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Stock symbol (overrides data.symbol)
    #[arg(long, global = true)]
    symbol: Option<String>,

    /// Benchmark index symbol (overrides data.index_symbol)
    #[arg(long, global = true)]
    index_symbol: Option<String>,

    /// Calendar days of history to load (overrides data.lookback_days)
    #[arg(long, global = true)]
    days: Option<i64>,

    /// Where bars come from (overrides data.source)
    #[arg(long, global = true, value_enum)]
    source: Option<SourceArg>,

    /// Scenario for the synthetic source
    #[arg(long, global = true, default_value = "volatile")]
    scenario: MarketScenario,

    /// Directory for CSV/JSON exports
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regime, signal and next-session prediction for the latest bar
    Advice,

    /// Stochastic enhancement-yield backtest
    Enhance,

    /// Deterministic multi-timeframe round-trip backtest
    RoundTrip,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Csv,
    Yahoo,
    Synthetic,
}

impl From<SourceArg> for DataSourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Csv => DataSourceKind::Csv,
            SourceArg::Yahoo => DataSourceKind::Yahoo,
            SourceArg::Synthetic => DataSourceKind::Synthetic,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing::info!(
        "holding-enhancer: {} vs {}, {} days from {:?}",
        config.data.symbol,
        config.data.index_symbol,
        config.data.lookback_days,
        config.data.source
    );

    let loader = BarLoader::new(&config, cli.scenario)?;
    let runner = BacktestRunner::new(config);

    match cli.command {
        Commands::Advice => run_advice(&runner, &loader).await,
        Commands::Enhance => run_enhance(&runner, &loader, cli.output).await,
        Commands::RoundTrip => run_round_trip(&runner, &loader, cli.output).await,
    }
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("holding_enhancer=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<EnhancerConfig> {
    let mut config =
        EnhancerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(symbol) = &cli.symbol {
        config.data.symbol = symbol.clone();
    }
    if let Some(index_symbol) = &cli.index_symbol {
        config.data.index_symbol = index_symbol.clone();
    }
    if let Some(days) = cli.days {
        config.data.lookback_days = days;
    }
    if let Some(source) = cli.source {
        config.data.source = source.into();
    }

    config.validate().context("Invalid command-line overrides")?;
    Ok(config)
}

/// Chooses the data source once and loads the views each command needs
struct BarLoader {
    source: Source,
    symbol: String,
    index_symbol: String,
    start: NaiveDate,
    end: NaiveDate,
}

enum Source {
    Csv(CsvDataSource),
    Yahoo(YahooDataSource),
    Synthetic(MarketScenario, u64),
}

impl BarLoader {
    fn new(config: &EnhancerConfig, scenario: MarketScenario) -> Result<Self> {
        let end = Local::now().date_naive();
        let start = end - Duration::days(config.data.lookback_days);

        let source = match config.data.source {
            DataSourceKind::Csv => Source::Csv(CsvDataSource::new(&config.data.csv_dir)),
            DataSourceKind::Yahoo => Source::Yahoo(
                YahooDataSource::from_config(&config.data)
                    .context("Failed to build Yahoo client")?,
            ),
            DataSourceKind::Synthetic => Source::Synthetic(scenario, config.data.synthetic_seed),
        };

        Ok(Self {
            source,
            symbol: config.data.symbol.clone(),
            index_symbol: config.data.index_symbol.clone(),
            start,
            end,
        })
    }

    /// Roughly five trading days per seven calendar days
    fn synthetic(&self, scenario: MarketScenario, seed: u64) -> Vec<IndexedBar> {
        let days = (self.end - self.start).num_days().max(1) as usize;
        SyntheticDataGenerator::new(seed).generate(scenario, days * 5 / 7)
    }

    async fn aligned(&self) -> Result<Vec<IndexedBar>> {
        match &self.source {
            Source::Csv(source) => self.load_aligned_from(source).await,
            Source::Yahoo(source) => self.load_aligned_from(source).await,
            Source::Synthetic(scenario, seed) => Ok(self.synthetic(*scenario, *seed)),
        }
    }

    async fn multi_period(&self) -> Result<MultiPeriodBars> {
        match &self.source {
            Source::Csv(source) => self.load_multi_period_from(source).await,
            Source::Yahoo(source) => self.load_multi_period_from(source).await,
            Source::Synthetic(scenario, seed) => {
                let daily = self
                    .synthetic(*scenario, *seed)
                    .into_iter()
                    .map(|b| b.bar)
                    .collect();
                Ok(data::multi_period(daily))
            }
        }
    }

    async fn load_aligned_from<S: MarketDataSource>(&self, source: &S) -> Result<Vec<IndexedBar>> {
        data::load_aligned(source, &self.symbol, &self.index_symbol, self.start, self.end)
            .await
            .with_context(|| {
                format!(
                    "Failed to load {} with index {} from {}",
                    self.symbol,
                    self.index_symbol,
                    source.name()
                )
            })
    }

    async fn load_multi_period_from<S: MarketDataSource>(
        &self,
        source: &S,
    ) -> Result<MultiPeriodBars> {
        data::load_multi_period(source, &self.symbol, self.start, self.end)
            .await
            .with_context(|| format!("Failed to load {} from {}", self.symbol, source.name()))
    }
}

async fn run_advice(runner: &BacktestRunner, loader: &BarLoader) -> Result<()> {
    let bars = loader.aligned().await?;
    let signals = runner.classify_and_signal(&bars);

    let views = loader.multi_period().await?;
    let next_session = match views.daily.last() {
        Some(last) => Some(
            DirectionalPredictor::new(runner.config().predictor.clone())
                .predict_or_wait(last.date, &views.daily, &views.weekly, &views.monthly)
                .context("Failed to predict the next session")?,
        ),
        None => None,
    };

    let advice = report::latest_advice(&signals, next_session)
        .context("No bars available for advice")?;
    advice.print_report();
    Ok(())
}

async fn run_enhance(
    runner: &BacktestRunner,
    loader: &BarLoader,
    output: Option<PathBuf>,
) -> Result<()> {
    let bars = loader.aligned().await?;
    let result = runner
        .run_enhancement(&bars)
        .context("Enhancement backtest failed")?;

    result.metrics.print_report("ENHANCEMENT BACKTEST REPORT");
    println!(
        "  Benchmark Return:      {:+.2}%\n",
        result.benchmark_return * 100.0
    );

    if let Some(dir) = output {
        let files = report::export_enhancement(&dir, &result)?;
        for file in files {
            println!("  Wrote {}", file.display());
        }
    }
    Ok(())
}

async fn run_round_trip(
    runner: &BacktestRunner,
    loader: &BarLoader,
    output: Option<PathBuf>,
) -> Result<()> {
    let views = loader.multi_period().await?;
    let result = runner
        .run_round_trip(&views)
        .context("Round-trip backtest failed")?;

    result.metrics.print_report("ROUND-TRIP BACKTEST REPORT");
    result.summary.print_report();

    if let Some(next) = result.predictions.last() {
        println!("\n🔮 NEXT SESSION ({} close)", next.as_of);
        println!("  Action:                {}", next.action);
        if let (Some(buy), Some(sell)) = (next.buy_price, next.sell_price) {
            println!("  Buy Price:             {:.2}", buy);
            println!("  Sell Price:            {:.2}", sell);
        }
    }

    if let Some(dir) = output {
        let files = report::export_round_trip(&dir, &result)?;
        for file in files {
            println!("  Wrote {}", file.display());
        }
    }
    Ok(())
}
