//! Multi-timeframe directional predictor.
//!
//! Monthly bars set the trend, weekly bars confirm it, daily bars time the entry.
//! Only when all three timeframes agree ("resonance") does the predictor commit to
//! a direction for the next session. The buy/sell targets are always derived from
//! the daily ATR around the last close.

use crate::config::PredictorConfig;
use crate::error::EnhancerError;
use crate::indicators::{analyze_trend, calculate_atr};
use crate::models::{Action, Bar, Prediction, Trend};
use chrono::NaiveDate;

pub struct DirectionalPredictor {
    config: PredictorConfig,
}

impl Default for DirectionalPredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

impl DirectionalPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    /// Whether the three views carry enough bars to attempt a prediction
    ///
    /// The daily view also needs a full ATR window, whatever `min_daily_bars` says.
    pub fn has_minimum_history(&self, daily: &[Bar], weekly: &[Bar], monthly: &[Bar]) -> bool {
        daily.len() >= self.config.min_daily_bars.max(self.config.atr_period)
            && weekly.len() >= self.config.min_weekly_bars
            && monthly.len() >= self.config.min_monthly_bars
    }

    /// Trend of one timeframe from its short/long moving averages
    pub fn trend(&self, bars: &[Bar]) -> Trend {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        analyze_trend(&closes, self.config.short_period, self.config.long_period)
    }

    /// Resonance rule: act only when every timeframe points the same non-flat way
    pub fn decide(month: Trend, week: Trend, day: Trend) -> Action {
        if month == week && week == day {
            match month {
                Trend::Up => Action::BuyFirst,
                Trend::Down => Action::SellFirst,
                Trend::Flat => Action::Wait,
            }
        } else {
            Action::Wait
        }
    }

    /// Forecast for the session after `as_of`
    ///
    /// Every series must end on or before `as_of`; anything later is a
    /// look-ahead and is rejected.
    pub fn predict(
        &self,
        as_of: NaiveDate,
        daily: &[Bar],
        weekly: &[Bar],
        monthly: &[Bar],
    ) -> Result<Prediction, EnhancerError> {
        ensure_no_look_ahead("daily", daily, as_of)?;
        ensure_no_look_ahead("weekly", weekly, as_of)?;
        ensure_no_look_ahead("monthly", monthly, as_of)?;

        let month_trend = self.trend(monthly);
        let week_trend = self.trend(weekly);
        let day_trend = self.trend(daily);

        let atr = calculate_atr(daily, self.config.atr_period).ok_or(
            EnhancerError::InsufficientData {
                needed: self.config.atr_period,
                got: daily.len(),
            },
        )?;
        let last_close = daily
            .last()
            .map(|b| b.close)
            .ok_or(EnhancerError::InsufficientData { needed: 1, got: 0 })?;

        let offset = self.config.atr_band_multiplier * atr;
        let action = Self::decide(month_trend, week_trend, day_trend);

        tracing::debug!(
            "{}: trends M={:?} W={:?} D={:?}, ATR={:.2}, action={}",
            as_of,
            month_trend,
            week_trend,
            day_trend,
            atr,
            action
        );

        Ok(Prediction {
            as_of,
            month_trend,
            week_trend,
            day_trend,
            action,
            buy_price: Some(last_close - offset),
            sell_price: Some(last_close + offset),
        })
    }

    /// Predict, or substitute Wait without computing anything when history is short
    pub fn predict_or_wait(
        &self,
        as_of: NaiveDate,
        daily: &[Bar],
        weekly: &[Bar],
        monthly: &[Bar],
    ) -> Result<Prediction, EnhancerError> {
        if !self.has_minimum_history(daily, weekly, monthly) {
            return Ok(Prediction::wait(as_of));
        }
        self.predict(as_of, daily, weekly, monthly)
    }
}

fn ensure_no_look_ahead(
    series: &'static str,
    bars: &[Bar],
    as_of: NaiveDate,
) -> Result<(), EnhancerError> {
    match bars.last() {
        Some(last) if last.date > as_of => Err(EnhancerError::LookAhead {
            series,
            last: last.date,
            as_of,
        }),
        _ => Ok(()),
    }
}
