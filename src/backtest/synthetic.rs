use crate::models::{Bar, IndexedBar};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+0.4% daily average)
    Uptrend,
    /// Steady downtrend with noise (-0.4% daily average)
    Downtrend,
    /// Mean-reverting chop around the starting price
    Sideways,
    /// Large daily swings (±5%)
    Volatile,
}

impl std::str::FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uptrend" | "up" => Ok(Self::Uptrend),
            "downtrend" | "down" => Ok(Self::Downtrend),
            "sideways" => Ok(Self::Sideways),
            "volatile" => Ok(Self::Volatile),
            other => Err(format!("unknown scenario: {}", other)),
        }
    }
}

/// Generates daily stock bars with a correlated index close
///
/// Dates are weekdays starting on the first trading Monday of 2022; the same seed
/// always yields the same series.
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_index: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 1700.0,
            base_index: 4000.0,
            base_volume: 3_000_000.0,
        }
    }

    pub fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default()
    }

    /// Generate `num_bars` trading days for a scenario
    pub fn generate(&mut self, scenario: MarketScenario, num_bars: usize) -> Vec<IndexedBar> {
        let mut bars = Vec::with_capacity(num_bars);
        let mut date = Self::start_date();
        let mut close = self.base_price;
        let mut index_close = self.base_index;

        for _ in 0..num_bars {
            let stock_return = self.next_return(scenario, close);
            let open = close * (1.0 + self.rng.gen_range(-0.003..0.003));
            close = (close * (1.0 + stock_return)).max(self.base_price * 0.2);

            // Index moves with the stock plus its own noise
            let index_return = 0.6 * stock_return + self.rng.gen_range(-0.005..0.005);
            index_close *= 1.0 + index_return;

            bars.push(IndexedBar {
                bar: self.create_bar(date, open, close, scenario),
                index_close,
            });
            date = next_trading_day(date);
        }

        bars
    }

    fn next_return(&mut self, scenario: MarketScenario, close: f64) -> f64 {
        match scenario {
            MarketScenario::Uptrend => 0.004 + self.rng.gen_range(-0.01..0.01),
            MarketScenario::Downtrend => -0.004 + self.rng.gen_range(-0.01..0.01),
            MarketScenario::Sideways => {
                // 10% pull back to the starting price
                let reversion = (self.base_price - close) / close * 0.1;
                reversion + self.rng.gen_range(-0.008..0.008)
            }
            MarketScenario::Volatile => {
                let change = self.rng.gen_range(-0.05..0.05);
                // Prevent price from going too low
                if close * (1.0 + change) < self.base_price * 0.5 {
                    change.abs()
                } else {
                    change
                }
            }
        }
    }

    /// Helper to create a bar whose range covers open and close
    fn create_bar(
        &mut self,
        date: NaiveDate,
        open: f64,
        close: f64,
        scenario: MarketScenario,
    ) -> Bar {
        let wick = match scenario {
            MarketScenario::Volatile => 0.02,
            _ => 0.01,
        };

        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..wick));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..wick));

        // Occasional volume spikes so the liquidity rules see both sides
        let spike = if self.rng.gen_bool(0.1) { 1.8 } else { 1.0 };
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3) * spike;

        Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

fn next_trading_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
        next += Duration::days(1);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Uptrend, 250);

        assert_eq!(bars.len(), 250);

        let first_price = bars.first().unwrap().bar.close;
        let last_price = bars.last().unwrap().bar.close;

        assert!(
            last_price > first_price,
            "Uptrend should end higher: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Downtrend, 250);

        let first_price = bars.first().unwrap().bar.close;
        let last_price = bars.last().unwrap().bar.close;

        assert!(
            last_price < first_price,
            "Downtrend should end lower: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Sideways, 500);

        // Should stay roughly around base price (±10%)
        let base = gen.base_price;
        for bar in &bars {
            assert!(
                bar.bar.close > base * 0.9 && bar.bar.close < base * 1.1,
                "Sideways should stay near base: {} vs {}",
                bar.bar.close,
                base
            );
        }
    }

    #[test]
    fn test_dates_skip_weekends() {
        let mut gen = SyntheticDataGenerator::new(7);
        let bars = gen.generate(MarketScenario::Volatile, 30);

        assert_eq!(bars[0].bar.date, SyntheticDataGenerator::start_date());
        for pair in bars.windows(2) {
            assert!(pair[1].bar.date > pair[0].bar.date);
        }
        for bar in &bars {
            assert!(!matches!(bar.bar.date.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn test_ohlc_consistency() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Volatile, 300);

        for bar in bars.iter().map(|b| b.bar) {
            assert!(bar.high >= bar.close, "High should be >= close");
            assert!(bar.high >= bar.open, "High should be >= open");
            assert!(bar.low <= bar.close, "Low should be <= close");
            assert!(bar.low <= bar.open, "Low should be <= open");
            assert!(bar.low > 0.0 && bar.volume > 0.0);
        }
    }

    #[test]
    fn test_same_seed_same_series() {
        let a = SyntheticDataGenerator::new(42).generate(MarketScenario::Sideways, 50);
        let b = SyntheticDataGenerator::new(42).generate(MarketScenario::Sideways, 50);

        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_scenario() {
        assert_eq!("Volatile".parse::<MarketScenario>(), Ok(MarketScenario::Volatile));
        assert!("crash".parse::<MarketScenario>().is_err());
    }
}
