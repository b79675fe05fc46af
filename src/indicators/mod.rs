// Technical indicators module
// Rolling statistics, SMA, ATR and the moving-average trend primitive

pub mod atr;
pub mod moving_average;
pub mod rolling;
pub mod trend;

pub use atr::{calculate_atr, true_ranges};
pub use moving_average::calculate_sma;
pub use rolling::{
    mean, pct_change, rolling_mean, rolling_mean_sparse, rolling_std, rolling_std_sparse,
    sample_std,
};
pub use trend::analyze_trend;
