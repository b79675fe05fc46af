use crate::error::DataError;
use crate::models::Bar;

/// Validates daily bars for sanity and correctness
pub struct BarValidator;

impl BarValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a single bar
    pub fn validate(&self, bar: &Bar) -> Result<(), DataError> {
        self.validate_prices(bar)?;
        self.validate_ohlc_relationship(bar)?;
        Ok(())
    }

    /// Validate every bar and that dates strictly increase
    pub fn validate_series(&self, bars: &[Bar]) -> Result<(), DataError> {
        for bar in bars {
            self.validate(bar)?;
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(invalid(
                    &pair[1],
                    format!("date does not follow previous bar ({})", pair[0].date),
                ));
            }
        }

        Ok(())
    }

    /// Validate that all prices are positive
    fn validate_prices(&self, bar: &Bar) -> Result<(), DataError> {
        let prices = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ];
        for (name, price) in prices {
            if !price.is_finite() || price <= 0.0 {
                return Err(invalid(bar, format!("invalid {} price: {}", name, price)));
            }
        }
        // Zero volume happens on suspended days
        if bar.volume.is_nan() || bar.volume < 0.0 {
            return Err(invalid(bar, format!("invalid volume: {}", bar.volume)));
        }
        Ok(())
    }

    /// Validate OHLC relationships (high >= low, etc.)
    fn validate_ohlc_relationship(&self, bar: &Bar) -> Result<(), DataError> {
        if bar.high < bar.low {
            return Err(invalid(
                bar,
                format!("high ({}) is less than low ({})", bar.high, bar.low),
            ));
        }

        if bar.high < bar.open.max(bar.close) {
            return Err(invalid(
                bar,
                format!(
                    "high ({}) is below open ({}) or close ({})",
                    bar.high, bar.open, bar.close
                ),
            ));
        }

        if bar.low > bar.open.min(bar.close) {
            return Err(invalid(
                bar,
                format!(
                    "low ({}) is above open ({}) or close ({})",
                    bar.low, bar.open, bar.close
                ),
            ));
        }

        Ok(())
    }
}

impl Default for BarValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(bar: &Bar, reason: String) -> DataError {
    DataError::InvalidBar {
        date: bar.date,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_valid_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: 100.0,
            high: 102.0,
            low: 99.0,
            close: 101.0,
            volume: 1_000_000.0,
        }
    }

    #[test]
    fn test_validate_valid_bar() {
        assert!(BarValidator::new().validate(&make_valid_bar()).is_ok());
    }

    #[test]
    fn test_validate_negative_open() {
        let mut bar = make_valid_bar();
        bar.open = -100.0;

        let result = BarValidator::new().validate(&bar);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("invalid open price"));
    }

    #[test]
    fn test_validate_nan_close() {
        let mut bar = make_valid_bar();
        bar.close = f64::NAN;

        assert!(BarValidator::new().validate(&bar).is_err());
    }

    #[test]
    fn test_validate_zero_volume_allowed() {
        let mut bar = make_valid_bar();
        bar.volume = 0.0;

        assert!(BarValidator::new().validate(&bar).is_ok());
    }

    #[test]
    fn test_validate_negative_volume() {
        let mut bar = make_valid_bar();
        bar.volume = -1.0;

        assert!(BarValidator::new().validate(&bar).is_err());
    }

    #[test]
    fn test_validate_high_less_than_close() {
        let mut bar = make_valid_bar();
        bar.high = 100.5;

        let result = BarValidator::new().validate(&bar);
        assert!(result.unwrap_err().to_string().contains("is below open"));
    }

    #[test]
    fn test_validate_low_greater_than_open() {
        let mut bar = make_valid_bar();
        bar.low = 100.5;

        let result = BarValidator::new().validate(&bar);
        assert!(result.unwrap_err().to_string().contains("is above open"));
    }

    #[test]
    fn test_validate_all_prices_equal() {
        let mut bar = make_valid_bar();
        bar.open = 100.0;
        bar.high = 100.0;
        bar.low = 100.0;
        bar.close = 100.0;

        assert!(BarValidator::new().validate(&bar).is_ok());
    }

    #[test]
    fn test_series_requires_increasing_dates() {
        let first = make_valid_bar();
        let mut second = make_valid_bar();

        let validator = BarValidator::new();
        assert!(validator.validate_series(&[first, second]).is_err());

        second.date = first.date.succ_opt().unwrap();
        assert!(validator.validate_series(&[first, second]).is_ok());
    }
}
