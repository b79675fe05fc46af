use crate::config::{PositionFractions, SignalConfig};
use crate::indicators::{rolling_mean, rolling_std};
use crate::models::{Regime, Signal, SignalDirection};
use crate::regime::ClassifiedBar;
use serde::Serialize;

/// Regime-labeled bar annotated with its band levels and signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalBar {
    pub classified: ClassifiedBar,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub signal: Signal,
}

impl SignalBar {
    pub fn regime(&self) -> Regime {
        self.classified.regime
    }

    pub fn close(&self) -> f64 {
        self.classified.bar.bar.close
    }
}

/// Rolling-band signal generator
///
/// Sell when the close breaks above the upper band in a Volatile or Risk-Off
/// regime, Buy when it breaks below the lower band in any regime, Hold otherwise.
/// Buy is applied after Sell, so it wins if both ever fire on one bar.
pub struct SignalGenerator {
    band_window: usize,
    band_width: f64,
    position_fractions: PositionFractions,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::from_config(&SignalConfig::default())
    }
}

impl SignalGenerator {
    pub fn new(band_window: usize, band_width: f64, position_fractions: PositionFractions) -> Self {
        Self {
            band_window,
            band_width,
            position_fractions,
        }
    }

    pub fn from_config(config: &SignalConfig) -> Self {
        Self::new(config.band_window, config.band_width, config.position_fractions)
    }

    /// Signal for a single bar given its band levels
    pub fn evaluate(
        &self,
        close: f64,
        regime: Regime,
        upper: Option<f64>,
        lower: Option<f64>,
    ) -> Signal {
        let mut direction = SignalDirection::Hold;

        if upper.is_some_and(|upper| close > upper)
            && matches!(regime, Regime::Volatile | Regime::RiskOff)
        {
            direction = SignalDirection::Sell;
        }

        if lower.is_some_and(|lower| close < lower) {
            direction = SignalDirection::Buy;
        }

        Signal {
            direction,
            position_fraction: self.position_fractions.fraction_for(regime),
        }
    }

    /// Annotate every bar with bands and a signal
    pub fn generate(&self, bars: &[ClassifiedBar]) -> Vec<SignalBar> {
        let closes: Vec<f64> = bars.iter().map(|b| b.bar.bar.close).collect();
        let ma = rolling_mean(&closes, self.band_window);
        let std = rolling_std(&closes, self.band_window);

        let signals: Vec<SignalBar> = bars
            .iter()
            .enumerate()
            .map(|(i, classified)| {
                let (upper, lower) = match (ma[i], std[i]) {
                    (Some(ma), Some(std)) => (
                        Some(ma + self.band_width * std),
                        Some(ma - self.band_width * std),
                    ),
                    _ => (None, None),
                };
                SignalBar {
                    classified: *classified,
                    upper,
                    lower,
                    signal: self.evaluate(closes[i], classified.regime, upper, lower),
                }
            })
            .collect();

        let sells = signals
            .iter()
            .filter(|s| s.signal.direction == SignalDirection::Sell)
            .count();
        let buys = signals
            .iter()
            .filter(|s| s.signal.direction == SignalDirection::Buy)
            .count();
        tracing::debug!(
            "Generated signals for {} bars: {} sell, {} buy",
            signals.len(),
            sells,
            buys
        );

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bar, IndexedBar};
    use crate::regime::RegimeFeatures;
    use chrono::{Duration, NaiveDate};

    fn create_classified(closes: &[f64], regime: Regime) -> Vec<ClassifiedBar> {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| ClassifiedBar {
                bar: IndexedBar {
                    bar: Bar {
                        date: start + Duration::days(i as i64),
                        open: close,
                        high: close,
                        low: close,
                        close,
                        volume: 1000.0,
                    },
                    index_close: 3000.0,
                },
                features: RegimeFeatures::default(),
                regime,
            })
            .collect()
    }

    /// 20 bars oscillating around 100 followed by `last`
    fn closes_ending_with(last: f64) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 101.0 } else { 99.0 })
            .collect();
        closes.push(last);
        closes
    }

    #[test]
    fn test_warmup_is_hold() {
        let bars = create_classified(&closes_ending_with(150.0)[..19], Regime::RiskOff);
        let signals = SignalGenerator::default().generate(&bars);

        for signal in &signals {
            assert_eq!(signal.signal.direction, SignalDirection::Hold);
            assert!(signal.upper.is_none());
        }
    }

    #[test]
    fn test_breakout_sells_in_risk_off() {
        let bars = create_classified(&closes_ending_with(110.0), Regime::RiskOff);
        let signals = SignalGenerator::default().generate(&bars);
        let last = signals.last().unwrap();

        assert!(last.close() > last.upper.unwrap());
        assert_eq!(last.signal.direction, SignalDirection::Sell);
        assert_eq!(last.signal.position_fraction, 0.8);
    }

    #[test]
    fn test_breakout_holds_in_risk_on() {
        let bars = create_classified(&closes_ending_with(110.0), Regime::RiskOn);
        let signals = SignalGenerator::default().generate(&bars);
        let last = signals.last().unwrap();

        assert_eq!(last.signal.direction, SignalDirection::Hold);
        assert_eq!(last.signal.position_fraction, 0.2);
    }

    #[test]
    fn test_breakdown_buys_in_any_regime() {
        for regime in Regime::ALL {
            let bars = create_classified(&closes_ending_with(90.0), regime);
            let signals = SignalGenerator::default().generate(&bars);

            assert_eq!(
                signals.last().unwrap().signal.direction,
                SignalDirection::Buy,
                "regime {}",
                regime
            );
        }
    }

    #[test]
    fn test_buy_overrides_sell() {
        let generator = SignalGenerator::default();
        // Inverted bands cannot occur from real data but exercise the rule order
        let signal = generator.evaluate(100.0, Regime::Volatile, Some(95.0), Some(105.0));

        assert_eq!(signal.direction, SignalDirection::Buy);
    }

    #[test]
    fn test_low_liquidity_has_no_position() {
        let signal =
            SignalGenerator::default().evaluate(100.0, Regime::LowLiquidity, None, None);

        assert_eq!(signal.direction, SignalDirection::Hold);
        assert_eq!(signal.position_fraction, 0.0);
    }
}
