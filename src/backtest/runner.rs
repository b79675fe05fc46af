use super::enhancement::{EnhancementRow, EnhancementSimulator};
use super::ledger::Ledger;
use super::metrics::{MetricsEngine, PerformanceMetrics, RoundTripSummary};
use super::round_trip::RoundTripSimulator;
use crate::config::EnhancerConfig;
use crate::models::{IndexedBar, MultiPeriodBars, Prediction};
use crate::regime::{regime_distribution, RegimeClassifier};
use crate::strategy::{DirectionalPredictor, SignalBar, SignalGenerator};
use crate::Result;
use crate::EnhancerError;

/// Output of the stochastic enhancement backtest
#[derive(Debug, Clone)]
pub struct EnhancementReport {
    pub signals: Vec<SignalBar>,
    pub rows: Vec<EnhancementRow>,
    pub metrics: PerformanceMetrics,
    /// Buy-and-hold return over the same bars
    pub benchmark_return: f64,
}

/// Output of the deterministic round-trip backtest
#[derive(Debug, Clone)]
pub struct RoundTripReport {
    pub predictions: Vec<Prediction>,
    pub ledger: Ledger,
    pub metrics: PerformanceMetrics,
    pub summary: RoundTripSummary,
}

/// Wires classifier, signal generator, predictor and simulators into full runs
///
/// Every run owns its own ledger and random stream, so runners can be used for
/// independent parameter sweeps.
pub struct BacktestRunner {
    config: EnhancerConfig,
}

impl Default for BacktestRunner {
    fn default() -> Self {
        Self::new(EnhancerConfig::default())
    }
}

impl BacktestRunner {
    pub fn new(config: EnhancerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    pub fn metrics_engine(&self) -> MetricsEngine {
        MetricsEngine::from_config(&self.config.metrics)
    }

    /// Regime labels followed by band signals
    pub fn classify_and_signal(&self, bars: &[IndexedBar]) -> Vec<SignalBar> {
        let classified = RegimeClassifier::from_config(&self.config.regime).classify(bars);

        let distribution = regime_distribution(&classified);
        tracing::info!("Regime distribution over {} bars: {:?}", bars.len(), distribution);

        SignalGenerator::from_config(&self.config.signals).generate(&classified)
    }

    /// Stochastic enhancement-yield backtest
    pub fn run_enhancement(&self, bars: &[IndexedBar]) -> Result<EnhancementReport> {
        if bars.len() < 2 {
            return Err(EnhancerError::InsufficientData {
                needed: 2,
                got: bars.len(),
            });
        }

        tracing::info!("Starting enhancement backtest: {} bars", bars.len());

        let signals = self.classify_and_signal(bars);
        let rows = EnhancementSimulator::new(self.config.enhancement.clone()).run(&signals);

        let nav: Vec<f64> = rows.iter().map(|r| r.strategy_nav).collect();
        let returns: Vec<f64> = rows.iter().map(|r| r.strategy_return).collect();
        let enhancements: Vec<f64> = rows.iter().map(|r| r.enhancement_return).collect();
        let metrics = self
            .metrics_engine()
            .compute_with_returns(&nav, &returns, &enhancements);
        let benchmark_return = rows.last().map_or(0.0, |r| r.benchmark_nav - 1.0);

        tracing::info!(
            "Enhancement backtest complete: strategy {:+.2}%, benchmark {:+.2}%, {} trades",
            metrics.total_return * 100.0,
            benchmark_return * 100.0,
            metrics.total_trades
        );

        Ok(EnhancementReport {
            signals,
            rows,
            metrics,
            benchmark_return,
        })
    }

    /// One prediction per daily bar, each made only from data dated on or before it
    ///
    /// Weekly and monthly bars are dated with their last trading day, so an
    /// unfinished period never leaks into an earlier prediction.
    pub fn predict_walk_forward(&self, bars: &MultiPeriodBars) -> Result<Vec<Prediction>> {
        let predictor = DirectionalPredictor::new(self.config.predictor.clone());

        let predictions = bars
            .daily
            .iter()
            .enumerate()
            .map(|(i, day)| {
                let as_of = day.date;
                let weekly_end = bars.weekly.partition_point(|b| b.date <= as_of);
                let monthly_end = bars.monthly.partition_point(|b| b.date <= as_of);

                predictor.predict_or_wait(
                    as_of,
                    &bars.daily[..=i],
                    &bars.weekly[..weekly_end],
                    &bars.monthly[..monthly_end],
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let active = predictions
            .iter()
            .filter(|p| p.action != crate::models::Action::Wait)
            .count();
        tracing::debug!(
            "Walk-forward produced {} predictions, {} directional",
            predictions.len(),
            active
        );

        Ok(predictions)
    }

    /// Deterministic multi-timeframe round-trip backtest
    pub fn run_round_trip(&self, bars: &MultiPeriodBars) -> Result<RoundTripReport> {
        tracing::info!(
            "Starting round-trip backtest: {} daily, {} weekly, {} monthly bars",
            bars.daily.len(),
            bars.weekly.len(),
            bars.monthly.len()
        );

        let predictions = self.predict_walk_forward(bars)?;
        let ledger = RoundTripSimulator::from_config(&self.config.round_trip)
            .run(&bars.daily, &predictions)?;

        let metrics = self
            .metrics_engine()
            .compute(&ledger.total_values(), &ledger.cash_deltas());
        let summary = RoundTripSummary::from_ledger(&ledger);

        tracing::info!(
            "Round-trip backtest complete: {} trade days, {:.1}% filled at target, alpha {:+.2}%",
            summary.trade_days,
            summary.fill_success_rate * 100.0,
            summary.alpha * 100.0
        );

        Ok(RoundTripReport {
            predictions,
            ledger,
            metrics,
            summary,
        })
    }
}
