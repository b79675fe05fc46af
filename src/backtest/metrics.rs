use super::ledger::Ledger;
use crate::config::MetricsConfig;
use crate::indicators::{mean, sample_std};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Performance of one value series
///
/// Returns and drawdowns are fractions (0.05 = 5%). Ratios with a zero
/// denominator are reported as 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    /// Deepest peak-to-trough decline, as a non-positive fraction
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub periods: usize,
}

impl PerformanceMetrics {
    /// Key/value view for reporting
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("total_return".to_string(), self.total_return),
            ("annualized_return".to_string(), self.annualized_return),
            ("max_drawdown".to_string(), self.max_drawdown),
            ("win_rate".to_string(), self.win_rate),
            ("sharpe_ratio".to_string(), self.sharpe_ratio),
            ("total_trades".to_string(), self.total_trades as f64),
            ("winning_trades".to_string(), self.winning_trades as f64),
            ("periods".to_string(), self.periods as f64),
        ])
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self, title: &str) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║ {:^53} ║", title);
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 RETURNS");
        println!("  Periods:               {}", self.periods);
        println!("  Total Return:          {:+.2}%", self.total_return * 100.0);
        println!(
            "  Annualized Return:     {:+.2}%",
            self.annualized_return * 100.0
        );

        println!("\n📈 TRADE STATISTICS");
        println!("  Total Trades:          {}", self.total_trades);
        println!(
            "  Winning Trades:        {} ({:.1}%)",
            self.winning_trades,
            self.win_rate * 100.0
        );

        println!("\n⚠️  RISK METRICS");
        println!("  Max Drawdown:          {:.2}%", self.max_drawdown * 100.0);
        println!("  Sharpe Ratio:          {:.2}", self.sharpe_ratio);

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}

pub struct MetricsEngine {
    risk_free_rate: f64,
    periods_per_year: f64,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::from_config(&MetricsConfig::default())
    }
}

impl MetricsEngine {
    pub fn new(risk_free_rate: f64, periods_per_year: f64) -> Self {
        Self {
            risk_free_rate,
            periods_per_year,
        }
    }

    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.risk_free_rate, config.periods_per_year)
    }

    /// Compute metrics for a value series and the per-trade outcomes behind it
    ///
    /// `values` may be a NAV starting at 1.0 or an absolute total-value series.
    /// Zero entries in `trade_pnls` are idle days and do not count as trades.
    pub fn compute(&self, values: &[f64], trade_pnls: &[f64]) -> PerformanceMetrics {
        self.compute_with_returns(values, &period_returns(values), trade_pnls)
    }

    /// Like `compute`, with the per-period returns supplied by the caller
    ///
    /// Used when the simulation already produced its daily returns, including
    /// the zero return of the first day, so the Sharpe ratio sees every period.
    pub fn compute_with_returns(
        &self,
        values: &[f64],
        returns: &[f64],
        trade_pnls: &[f64],
    ) -> PerformanceMetrics {
        let periods = values.len();
        let total_return = calculate_total_return(values).unwrap_or(0.0);
        let annualized_return = self.annualize(total_return, periods);

        let sharpe_ratio = self.calculate_sharpe_ratio(returns).unwrap_or(0.0);

        let trades: Vec<f64> = trade_pnls.iter().copied().filter(|p| *p != 0.0).collect();
        let winning_trades = trades.iter().filter(|p| **p > 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            winning_trades as f64 / trades.len() as f64
        };

        PerformanceMetrics {
            total_return,
            annualized_return,
            max_drawdown: calculate_max_drawdown(values),
            win_rate,
            sharpe_ratio,
            total_trades: trades.len(),
            winning_trades,
            periods,
        }
    }

    /// `(1 + total)^(periods_per_year / n) - 1`; a total loss annualizes to -1
    pub fn annualize(&self, total_return: f64, periods: usize) -> f64 {
        if periods == 0 {
            return 0.0;
        }
        let growth = 1.0 + total_return;
        if growth <= 0.0 {
            return -1.0;
        }
        growth.powf(self.periods_per_year / periods as f64) - 1.0
    }

    /// Annualized excess return over annualized volatility of per-period returns
    pub fn calculate_sharpe_ratio(&self, returns: &[f64]) -> Option<f64> {
        let avg = mean(returns)?;
        let std = sample_std(returns)?;
        if std <= 0.0 || !std.is_finite() {
            return None;
        }
        let excess = avg * self.periods_per_year - self.risk_free_rate;
        Some(excess / (std * self.periods_per_year.sqrt()))
    }
}

pub fn calculate_total_return(values: &[f64]) -> Option<f64> {
    let first = *values.first()?;
    let last = *values.last()?;
    if first == 0.0 {
        return None;
    }
    Some(last / first - 1.0)
}

/// Simple returns between consecutive values
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// `(value - running max) / running max` for every point
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    values
        .iter()
        .map(|&value| {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                (value - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

pub fn calculate_max_drawdown(values: &[f64]) -> f64 {
    drawdown_series(values).into_iter().fold(0.0, f64::min)
}

/// Execution statistics of a deterministic round-trip run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundTripSummary {
    pub sessions: usize,
    pub trade_days: usize,
    /// Sessions where both legs filled at their targets
    pub success_count: usize,
    pub fill_success_rate: f64,
    pub total_cash_delta: f64,
    pub final_value: f64,
    pub final_benchmark: f64,
    /// Relative outperformance of the final value over the benchmark
    pub alpha: f64,
}

impl RoundTripSummary {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let rows = ledger.rows();
        let trade_days = rows.iter().filter(|r| r.trade_type.is_trade()).count();
        let success_count = rows.iter().filter(|r| r.trade_type.is_success()).count();
        let fill_success_rate = if trade_days > 0 {
            success_count as f64 / trade_days as f64
        } else {
            0.0
        };

        let (final_value, final_benchmark) = ledger
            .last()
            .map(|r| (r.total_value, r.benchmark_value))
            .unwrap_or((ledger.initial_cash(), ledger.initial_cash()));
        let alpha = if final_benchmark != 0.0 {
            (final_value - final_benchmark) / final_benchmark
        } else {
            0.0
        };

        Self {
            sessions: rows.len(),
            trade_days,
            success_count,
            fill_success_rate,
            total_cash_delta: ledger.cash() - ledger.initial_cash(),
            final_value,
            final_benchmark,
            alpha,
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("sessions".to_string(), self.sessions as f64),
            ("trade_days".to_string(), self.trade_days as f64),
            ("success_count".to_string(), self.success_count as f64),
            ("fill_success_rate".to_string(), self.fill_success_rate),
            ("total_cash_delta".to_string(), self.total_cash_delta),
            ("final_value".to_string(), self.final_value),
            ("final_benchmark".to_string(), self.final_benchmark),
            ("alpha".to_string(), self.alpha),
        ])
    }

    pub fn print_report(&self) {
        println!("💰 ROUND TRIPS");
        println!("  Sessions:              {}", self.sessions);
        println!("  Trade Days:            {}", self.trade_days);
        println!(
            "  Filled At Target:      {} ({:.1}%)",
            self.success_count,
            self.fill_success_rate * 100.0
        );
        println!("  Cash Generated:        {:+.2}", self.total_cash_delta);
        println!("  Final Value:           {:.2}", self.final_value);
        println!("  Benchmark Value:       {:.2}", self.final_benchmark);
        println!("  Alpha:                 {:+.2}%", self.alpha * 100.0);
    }
}
