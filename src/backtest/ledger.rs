use crate::models::{TradeOutcome, TradeType};
use chrono::NaiveDate;
use serde::Serialize;

/// Shares bought or sold per round-trip leg, independent of the position size
pub const LOT_SIZE: f64 = 100.0;

/// One simulated session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub close: f64,
    pub trade_type: TradeType,
    pub cash_delta: f64,
    pub cash: f64,
    pub shares_held: u32,
    pub stock_value: f64,
    pub total_value: f64,
    /// Passive comparator: initial cash reserve plus the held shares at today's close
    pub benchmark_value: f64,
}

/// Cash/shares state of one simulation run
///
/// The share count is fixed at construction; only completed round trips move cash.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    shares_held: u32,
    initial_cash: f64,
    cash: f64,
    rows: Vec<LedgerRow>,
}

impl Ledger {
    /// Start with a cash reserve equal in value to the stock position at `first_close`
    pub fn new(shares_held: u32, first_close: f64) -> Self {
        let initial_cash = shares_held as f64 * first_close;
        Self {
            shares_held,
            initial_cash,
            cash: initial_cash,
            rows: Vec::new(),
        }
    }

    pub fn shares_held(&self) -> u32 {
        self.shares_held
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn last(&self) -> Option<&LedgerRow> {
        self.rows.last()
    }

    /// Apply one session's outcome and record the resulting state
    pub fn record(&mut self, date: NaiveDate, close: f64, outcome: TradeOutcome) -> &LedgerRow {
        self.cash += outcome.cash_delta;

        let stock_value = self.shares_held as f64 * close;
        self.rows.push(LedgerRow {
            date,
            close,
            trade_type: outcome.trade_type,
            cash_delta: outcome.cash_delta,
            cash: self.cash,
            shares_held: self.shares_held,
            stock_value,
            total_value: self.cash + stock_value,
            benchmark_value: self.initial_cash + stock_value,
        });

        &self.rows[self.rows.len() - 1]
    }

    pub fn total_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total_value).collect()
    }

    pub fn benchmark_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.benchmark_value).collect()
    }

    pub fn cash_deltas(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cash_delta).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_initial_cash_matches_position_value() {
        let ledger = Ledger::new(100, 1700.0);

        assert_eq!(ledger.initial_cash(), 170_000.0);
        assert_eq!(ledger.cash(), 170_000.0);
        assert!(ledger.rows().is_empty());
    }

    #[test]
    fn test_record_trade_and_idle_day() {
        let mut ledger = Ledger::new(100, 1700.0);

        let row = *ledger.record(
            day(2),
            1710.0,
            TradeOutcome {
                trade_type: TradeType::BuyFirstSuccess,
                cash_delta: 1931.6,
            },
        );
        assert!((row.cash - 171_931.6).abs() < 1e-9);
        assert_eq!(row.stock_value, 171_000.0);
        assert!((row.total_value - 342_931.6).abs() < 1e-9);
        assert_eq!(row.benchmark_value, 341_000.0);

        let idle = *ledger.record(day(3), 1690.0, TradeOutcome::none());
        assert_eq!(idle.cash_delta, 0.0);
        assert!((idle.cash - 171_931.6).abs() < 1e-9);
        assert_eq!(idle.benchmark_value, 170_000.0 + 169_000.0);
    }

    #[test]
    fn test_shares_never_change() {
        let mut ledger = Ledger::new(300, 50.0);
        for d in 1..10 {
            ledger.record(
                day(d),
                50.0 + d as f64,
                TradeOutcome {
                    trade_type: TradeType::SellFirstFailedClose,
                    cash_delta: -12.5,
                },
            );
        }

        assert!(ledger.rows().iter().all(|r| r.shares_held == 300));
        assert_eq!(ledger.shares_held(), 300);
    }
}
