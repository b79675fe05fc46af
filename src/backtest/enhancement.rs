//! Stochastic enhancement-yield model.
//!
//! An illustrative overlay, not a prediction: on signal days the round trip is
//! won or lost by a uniform draw against a regime-dependent win probability, and
//! the result is a fixed share of the day's amplitude scaled by the suggested
//! position fraction. The draw sequence comes from `StdRng::seed_from_u64(seed)`
//! with exactly one draw per bar, in bar order, whether or not the bar trades.
//! Golden outputs therefore depend on that exact sequence, not just its distribution.

use crate::config::EnhancementConfig;
use crate::models::{Regime, SignalDirection};
use crate::strategy::SignalBar;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnhancementRow {
    pub date: NaiveDate,
    pub close: f64,
    pub regime: Regime,
    pub signal: i8,
    pub position_fraction: f64,
    /// (high - low) / previous close; undefined on the first bar
    pub amplitude: Option<f64>,
    pub win_draw: f64,
    pub enhancement_return: f64,
    pub stock_return: f64,
    pub strategy_return: f64,
    pub strategy_nav: f64,
    pub benchmark_nav: f64,
}

pub struct EnhancementSimulator {
    config: EnhancementConfig,
}

impl Default for EnhancementSimulator {
    fn default() -> Self {
        Self::new(EnhancementConfig::default())
    }
}

impl EnhancementSimulator {
    pub fn new(config: EnhancementConfig) -> Self {
        Self { config }
    }

    /// Enhancement return for one bar given its draw
    pub fn enhancement_return(
        &self,
        direction: SignalDirection,
        regime: Regime,
        position_fraction: f64,
        amplitude: f64,
        draw: f64,
    ) -> f64 {
        if direction == SignalDirection::Hold || position_fraction <= 0.0 {
            return 0.0;
        }

        let costs = 2.0 * self.config.transaction_cost;
        let win_probability = self.config.win_probabilities.for_regime(regime);

        if draw < win_probability {
            self.config.win_capture * amplitude * position_fraction - costs
        } else {
            -self.config.loss_capture * amplitude * position_fraction - costs
        }
    }

    pub fn run(&self, bars: &[SignalBar]) -> Vec<EnhancementRow> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut rows = Vec::with_capacity(bars.len());

        let Some(first) = bars.first() else {
            return rows;
        };
        let first_close = first.close();
        let mut strategy_nav = 1.0;

        for (i, signal_bar) in bars.iter().enumerate() {
            let bar = signal_bar.classified.bar.bar;
            let draw: f64 = rng.gen();

            let prev_close = (i > 0).then(|| bars[i - 1].close());
            let amplitude = prev_close.map(|prev| (bar.high - bar.low) / prev);
            let stock_return = prev_close.map_or(0.0, |prev| bar.close / prev - 1.0);

            let enhancement_return = amplitude.map_or(0.0, |amplitude| {
                self.enhancement_return(
                    signal_bar.signal.direction,
                    signal_bar.regime(),
                    signal_bar.signal.position_fraction,
                    amplitude,
                    draw,
                )
            });

            let strategy_return = stock_return + enhancement_return;
            strategy_nav *= 1.0 + strategy_return;

            rows.push(EnhancementRow {
                date: bar.date,
                close: bar.close,
                regime: signal_bar.regime(),
                signal: signal_bar.signal.direction.value(),
                position_fraction: signal_bar.signal.position_fraction,
                amplitude,
                win_draw: draw,
                enhancement_return,
                stock_return,
                strategy_return,
                strategy_nav,
                benchmark_nav: bar.close / first_close,
            });
        }

        let active = rows.iter().filter(|r| r.enhancement_return != 0.0).count();
        tracing::info!(
            "Enhancement simulation complete: {} bars, {} enhancement days, seed {}",
            rows.len(),
            active,
            self.config.seed
        );

        rows
    }
}
