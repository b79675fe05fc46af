//! Average True Range (ATR) indicator
//!
//! Measures market volatility by averaging true ranges over a period.
//! True Range is the greatest of:
//! - Current High - Current Low
//! - Abs(Current High - Previous Close)
//! - Abs(Current Low - Previous Close)
//!
//! The first bar has no previous close, so its true range is just High - Low.
//! ATR here is the simple mean of the last `period` true ranges.

use crate::models::Bar;

/// True range for every bar, aligned with the input
pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let high_low = bar.high - bar.low;
        let tr = if i == 0 {
            high_low
        } else {
            let prev_close = bars[i - 1].close;
            high_low
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        };
        ranges.push(tr);
    }

    ranges
}

/// Calculate ATR at the latest bar
///
/// Returns None if fewer than `period` bars are available
pub fn calculate_atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let ranges = true_ranges(bars);
    let sum: f64 = ranges.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn create_test_bars(prices: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                date: start + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_calculate_atr_flat_market() {
        let prices = vec![(100.0, 101.0, 99.0, 100.0); 15];

        let bars = create_test_bars(&prices);
        let atr = calculate_atr(&bars, 14);

        assert_eq!(atr, Some(2.0));
    }

    #[test]
    fn test_true_range_accounts_for_gaps() {
        let bars = create_test_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            // Gap up: high - prev close dominates
            (108.0, 110.0, 107.0, 109.0),
            // Gap down: prev close - low dominates
            (100.0, 101.0, 95.0, 96.0),
        ]);

        let ranges = true_ranges(&bars);

        assert_eq!(ranges, vec![2.0, 10.0, 14.0]);
    }

    #[test]
    fn test_atr_uses_latest_window() {
        let mut prices = vec![(100.0, 110.0, 90.0, 100.0); 5];
        prices.extend(vec![(100.0, 101.0, 99.0, 100.0); 3]);

        let bars = create_test_bars(&prices);
        let atr = calculate_atr(&bars, 3).unwrap();

        assert!((atr - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_data() {
        let prices = vec![(100.0, 101.0, 99.0, 100.0), (100.0, 101.0, 99.0, 100.0)];

        let bars = create_test_bars(&prices);
        let atr = calculate_atr(&bars, 14);

        assert!(atr.is_none());
    }
}
