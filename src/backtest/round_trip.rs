//! Deterministic fill-against-range round-trip simulator.
//!
//! Each session executes at most one round trip of `LOT_SIZE` shares using the
//! previous session's prediction. A leg fills at its target price once the day's
//! range touches it; if the opening leg fills but the closing leg's target is never
//! reached, the closing leg is forced at the day's close. The underlying share
//! count never changes.

use super::ledger::{Ledger, LOT_SIZE};
use crate::config::RoundTripConfig;
use crate::error::EnhancerError;
use crate::models::{Action, Bar, Prediction, TradeOutcome, TradeType};

/// Cash paid to buy one lot at `price`, fee included
pub fn buy_cost(price: f64, fee: f64) -> f64 {
    price * LOT_SIZE * (1.0 + fee)
}

/// Cash received for selling one lot at `price`, fee deducted
pub fn sell_revenue(price: f64, fee: f64) -> f64 {
    price * LOT_SIZE * (1.0 - fee)
}

/// Simulate one session against the day's high/low range
pub fn simulate_session(bar: &Bar, prediction: &Prediction, fee: f64) -> TradeOutcome {
    let (Some(buy_price), Some(sell_price)) = (prediction.buy_price, prediction.sell_price) else {
        return TradeOutcome::none();
    };

    match prediction.action {
        Action::BuyFirst => {
            if bar.low > buy_price {
                return TradeOutcome::none();
            }
            let cost = buy_cost(buy_price, fee);

            if bar.high >= sell_price {
                TradeOutcome {
                    trade_type: TradeType::BuyFirstSuccess,
                    cash_delta: sell_revenue(sell_price, fee) - cost,
                }
            } else {
                TradeOutcome {
                    trade_type: TradeType::BuyFirstFailedClose,
                    cash_delta: sell_revenue(bar.close, fee) - cost,
                }
            }
        }
        Action::SellFirst | Action::RangeTrade => {
            if bar.high < sell_price {
                return TradeOutcome::none();
            }
            let revenue = sell_revenue(sell_price, fee);

            if bar.low <= buy_price {
                TradeOutcome {
                    trade_type: TradeType::SellFirstSuccess,
                    cash_delta: revenue - buy_cost(buy_price, fee),
                }
            } else {
                TradeOutcome {
                    trade_type: TradeType::SellFirstFailedClose,
                    cash_delta: revenue - buy_cost(bar.close, fee),
                }
            }
        }
        Action::Wait => TradeOutcome::none(),
    }
}

pub struct RoundTripSimulator {
    initial_shares: u32,
    fee: f64,
}

impl Default for RoundTripSimulator {
    fn default() -> Self {
        Self::from_config(&RoundTripConfig::default())
    }
}

impl RoundTripSimulator {
    pub fn new(initial_shares: u32, fee: f64) -> Self {
        Self {
            initial_shares,
            fee,
        }
    }

    pub fn from_config(config: &RoundTripConfig) -> Self {
        Self::new(config.initial_shares, config.fee)
    }

    /// Run the simulation over `bars`
    ///
    /// `predictions[i]` must have been made with data through `bars[i]`; session
    /// `i` trades on `predictions[i - 1]`. The first bar only seeds the ledger.
    pub fn run(&self, bars: &[Bar], predictions: &[Prediction]) -> Result<Ledger, EnhancerError> {
        if bars.len() < 2 {
            return Err(EnhancerError::InsufficientData {
                needed: 2,
                got: bars.len(),
            });
        }
        if predictions.len() != bars.len() {
            return Err(EnhancerError::MisalignedPredictions {
                predictions: predictions.len(),
                bars: bars.len(),
            });
        }

        let mut ledger = Ledger::new(self.initial_shares, bars[0].close);

        for i in 1..bars.len() {
            let bar = &bars[i];
            let prediction = &predictions[i - 1];

            if prediction.as_of >= bar.date {
                return Err(EnhancerError::LookAhead {
                    series: "prediction",
                    last: prediction.as_of,
                    as_of: bar.date,
                });
            }

            let outcome = simulate_session(bar, prediction, self.fee);
            if outcome.trade_type.is_trade() {
                tracing::debug!(
                    "{}: {} cash delta {:+.2}",
                    bar.date,
                    outcome.trade_type,
                    outcome.cash_delta
                );
            }
            ledger.record(bar.date, bar.close, outcome);
        }

        if let Some(last) = ledger.last() {
            tracing::info!(
                "Round-trip simulation complete: {} sessions, cash {:.2}, total value {:.2}",
                ledger.rows().len(),
                last.cash,
                last.total_value
            );
        }

        Ok(ledger)
    }
}
