use crate::models::{Bar, MultiPeriodBars};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Aggregation period for resampled bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Weekly,
    Monthly,
}

impl Period {
    /// Bucket key of a trading day: ISO (year, week) or calendar (year, month)
    fn bucket(self, date: NaiveDate) -> (i32, u32) {
        match self {
            Period::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            Period::Monthly => (date.year(), date.month()),
        }
    }
}

/// Aggregate daily bars into weekly or monthly bars
///
/// Each output bar takes the first open, highest high, lowest low, last close and
/// summed volume of its bucket, and is dated with the bucket's last trading day.
/// Input must be sorted by date.
pub fn resample(daily: &[Bar], period: Period) -> Vec<Bar> {
    let mut buckets: BTreeMap<(i32, u32), Vec<&Bar>> = BTreeMap::new();
    for bar in daily {
        buckets.entry(period.bucket(bar.date)).or_default().push(bar);
    }

    buckets
        .into_values()
        .filter_map(|bars| aggregate(&bars))
        .collect()
}

fn aggregate(bars: &[&Bar]) -> Option<Bar> {
    let first = bars.first()?;
    let last = bars.last()?;

    Some(Bar {
        date: last.date,
        open: first.open,
        high: bars.iter().map(|b| b.high).fold(f64::MIN, f64::max),
        low: bars.iter().map(|b| b.low).fold(f64::MAX, f64::min),
        close: last.close,
        volume: bars.iter().map(|b| b.volume).sum(),
    })
}

/// Daily bars together with their weekly and monthly aggregates
pub fn multi_period(daily: Vec<Bar>) -> MultiPeriodBars {
    let weekly = resample(&daily, Period::Weekly);
    let monthly = resample(&daily, Period::Monthly);

    tracing::debug!(
        "Resampled {} daily bars into {} weekly and {} monthly",
        daily.len(),
        weekly.len(),
        monthly.len()
    );

    MultiPeriodBars {
        daily,
        weekly,
        monthly,
    }
}
