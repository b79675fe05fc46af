//! Market Regime Classifier using index trend, return volatility and volume
//!
//! Rules are evaluated in a fixed order and the first match wins:
//! 1. Risk-On: index above its moving average AND volume above its moving average
//! 2. Volatile: return volatility above its long baseline AND a calm index day
//!    (absolute index change below the all-time index standard deviation)
//! 3. Risk-Off: index below its moving average
//!
//! Anything else, including the warm-up period, is Low-Liquidity.

use crate::config::RegimeConfig;
use crate::indicators::{
    pct_change, rolling_mean, rolling_mean_sparse, rolling_std_sparse, sample_std,
};
use crate::models::{IndexedBar, Regime};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rolling features computed for one bar; `None` while the window is incomplete
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RegimeFeatures {
    pub ma_index: Option<f64>,
    pub ma_stock: Option<f64>,
    pub volatility: Option<f64>,
    pub volatility_baseline: Option<f64>,
    pub vol_ma: Option<f64>,
    pub index_change: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifiedBar {
    pub bar: IndexedBar,
    pub features: RegimeFeatures,
    pub regime: Regime,
}

/// Inputs every rule predicate sees
pub struct RuleContext<'a> {
    pub bar: &'a IndexedBar,
    pub features: &'a RegimeFeatures,
    /// Standard deviation of the whole index close series
    pub index_std: Option<f64>,
}

type RulePredicate = fn(&RuleContext<'_>) -> bool;

/// Ordered (predicate, label) pairs; evaluation stops at the first true predicate
const RULES: [(RulePredicate, Regime); 3] = [
    (is_risk_on, Regime::RiskOn),
    (is_volatile, Regime::Volatile),
    (is_risk_off, Regime::RiskOff),
];

fn is_risk_on(ctx: &RuleContext<'_>) -> bool {
    match (ctx.features.ma_index, ctx.features.vol_ma) {
        (Some(ma_index), Some(vol_ma)) => {
            ctx.bar.index_close > ma_index && ctx.bar.bar.volume > vol_ma
        }
        _ => false,
    }
}

fn is_volatile(ctx: &RuleContext<'_>) -> bool {
    match (
        ctx.features.volatility,
        ctx.features.volatility_baseline,
        ctx.features.index_change,
        ctx.index_std,
    ) {
        (Some(volatility), Some(baseline), Some(change), Some(index_std)) => {
            volatility > baseline && change.abs() < index_std
        }
        _ => false,
    }
}

fn is_risk_off(ctx: &RuleContext<'_>) -> bool {
    ctx.features
        .ma_index
        .is_some_and(|ma_index| ctx.bar.index_close < ma_index)
}

/// First-match evaluation of the rule list
pub fn classify_bar(ctx: &RuleContext<'_>) -> Regime {
    RULES
        .iter()
        .find(|(predicate, _)| predicate(ctx))
        .map(|(_, regime)| *regime)
        .unwrap_or(Regime::LowLiquidity)
}

pub struct RegimeClassifier {
    window: usize,
    volatility_baseline_window: usize,
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self::from_config(&RegimeConfig::default())
    }
}

impl RegimeClassifier {
    pub fn new(window: usize, volatility_baseline_window: usize) -> Self {
        Self {
            window,
            volatility_baseline_window,
        }
    }

    pub fn from_config(config: &RegimeConfig) -> Self {
        Self::new(config.window, config.volatility_baseline_window)
    }

    /// Bars before this index are always Low-Liquidity
    pub fn warmup(&self) -> usize {
        self.window.max(self.volatility_baseline_window)
    }

    /// Compute rolling features for every bar
    pub fn features(&self, bars: &[IndexedBar]) -> Vec<RegimeFeatures> {
        let index_closes: Vec<f64> = bars.iter().map(|b| b.index_close).collect();
        let stock_closes: Vec<f64> = bars.iter().map(|b| b.bar.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.bar.volume).collect();

        let ma_index = rolling_mean(&index_closes, self.window);
        let ma_stock = rolling_mean(&stock_closes, self.window);
        let returns = pct_change(&stock_closes);
        let volatility = rolling_std_sparse(&returns, self.window);
        let volatility_baseline = rolling_mean_sparse(&volatility, self.volatility_baseline_window);
        let vol_ma = rolling_mean(&volumes, self.window);

        (0..bars.len())
            .map(|i| RegimeFeatures {
                ma_index: ma_index[i],
                ma_stock: ma_stock[i],
                volatility: volatility[i],
                volatility_baseline: volatility_baseline[i],
                vol_ma: vol_ma[i],
                index_change: (i > 0).then(|| index_closes[i] - index_closes[i - 1]),
            })
            .collect()
    }

    /// Label every bar with exactly one regime, preserving order
    pub fn classify(&self, bars: &[IndexedBar]) -> Vec<ClassifiedBar> {
        let features = self.features(bars);
        let index_closes: Vec<f64> = bars.iter().map(|b| b.index_close).collect();
        let index_std = sample_std(&index_closes);
        let warmup = self.warmup();

        let classified: Vec<ClassifiedBar> = bars
            .iter()
            .zip(features)
            .enumerate()
            .map(|(i, (bar, features))| {
                let regime = if i < warmup {
                    Regime::LowLiquidity
                } else {
                    classify_bar(&RuleContext {
                        bar,
                        features: &features,
                        index_std,
                    })
                };
                ClassifiedBar {
                    bar: *bar,
                    features,
                    regime,
                }
            })
            .collect();

        let distribution = regime_distribution(&classified);
        tracing::debug!(
            "Classified {} bars (warm-up {}): {:?}",
            classified.len(),
            warmup,
            distribution
        );

        classified
    }
}

/// Count of bars per regime
pub fn regime_distribution(bars: &[ClassifiedBar]) -> BTreeMap<Regime, usize> {
    let mut counts = BTreeMap::new();
    for bar in bars {
        *counts.entry(bar.regime).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;
    use chrono::{Duration, NaiveDate};

    fn create_test_bars(rows: &[(f64, f64, f64)]) -> Vec<IndexedBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(close, volume, index_close))| IndexedBar {
                bar: Bar {
                    date: start + Duration::days(i as i64),
                    open: close,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume,
                },
                index_close,
            })
            .collect()
    }

    /// Quiet stock for 85 bars then large swings, slowly rising index
    fn volatile_rising_rows(last_volume: f64) -> Vec<(f64, f64, f64)> {
        (0..90)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                let amplitude = if i < 85 { 0.001 } else { 0.05 };
                let volume = if i == 89 { last_volume } else { 1000.0 };
                (100.0 * (1.0 + amplitude * sign), volume, 1000.0 + 0.5 * i as f64)
            })
            .collect()
    }

    #[test]
    fn test_warmup_is_low_liquidity() {
        // Rising index with rising volume would be Risk-On once windows fill
        let rows: Vec<_> = (0..100)
            .map(|i| (100.0 + i as f64, 1000.0 + 10.0 * i as f64, 3000.0 + i as f64))
            .collect();
        let bars = create_test_bars(&rows);

        let classifier = RegimeClassifier::default();
        let classified = classifier.classify(&bars);

        assert_eq!(classified.len(), bars.len());
        for bar in &classified[..60] {
            assert_eq!(bar.regime, Regime::LowLiquidity);
        }
        assert_eq!(classified[60].regime, Regime::RiskOn);
    }

    #[test]
    fn test_risk_on_wins_over_volatile() {
        let bars = create_test_bars(&volatile_rising_rows(5000.0));
        let classifier = RegimeClassifier::default();
        let classified = classifier.classify(&bars);
        let last = classified.last().unwrap();

        // Both conditions hold on the last bar
        let features = last.features;
        assert!(features.volatility.unwrap() > features.volatility_baseline.unwrap());
        assert!(last.bar.bar.volume > features.vol_ma.unwrap());
        assert!(last.bar.index_close > features.ma_index.unwrap());

        assert_eq!(last.regime, Regime::RiskOn);
    }

    #[test]
    fn test_volatile_without_volume_confirmation() {
        let bars = create_test_bars(&volatile_rising_rows(1000.0));
        let classifier = RegimeClassifier::default();
        let classified = classifier.classify(&bars);

        assert_eq!(classified.last().unwrap().regime, Regime::Volatile);
    }

    #[test]
    fn test_falling_index_is_risk_off() {
        let rows: Vec<_> = (0..90).map(|i| (100.0, 1000.0, 2000.0 - i as f64)).collect();
        let bars = create_test_bars(&rows);

        let classified = RegimeClassifier::default().classify(&bars);

        for bar in &classified[60..] {
            assert_eq!(bar.regime, Regime::RiskOff);
        }
    }

    #[test]
    fn test_rule_order_on_synthetic_context() {
        let bar = create_test_bars(&[(100.0, 2000.0, 1010.0)])[0];
        let features = RegimeFeatures {
            ma_index: Some(1000.0),
            ma_stock: Some(100.0),
            volatility: Some(0.03),
            volatility_baseline: Some(0.01),
            vol_ma: Some(1000.0),
            index_change: Some(1.0),
        };
        let ctx = RuleContext {
            bar: &bar,
            features: &features,
            index_std: Some(50.0),
        };

        assert!(is_risk_on(&ctx));
        assert!(is_volatile(&ctx));
        assert_eq!(classify_bar(&ctx), Regime::RiskOn);
    }

    #[test]
    fn test_undefined_features_fall_through() {
        let bar = create_test_bars(&[(100.0, 2000.0, 1010.0)])[0];
        let features = RegimeFeatures::default();
        let ctx = RuleContext {
            bar: &bar,
            features: &features,
            index_std: None,
        };

        assert_eq!(classify_bar(&ctx), Regime::LowLiquidity);
    }
}
