use super::moving_average::calculate_sma;
use crate::models::Trend;

/// Moving-average trend primitive
///
/// Up when the short SMA is above the long SMA at the latest point, Down when below,
/// Flat when equal or when either average is undefined (too little history).
pub fn analyze_trend(closes: &[f64], short_period: usize, long_period: usize) -> Trend {
    let (Some(short), Some(long)) = (
        calculate_sma(closes, short_period),
        calculate_sma(closes, long_period),
    ) else {
        return Trend::Flat;
    };

    if short > long {
        Trend::Up
    } else if short < long {
        Trend::Down
    } else {
        Trend::Flat
    }
}
