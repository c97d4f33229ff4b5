//! Reduces the provider's 3-hour-step forecast to one sample per calendar day.
//!
//! Days are UTC calendar days. The location's timezone offset is not applied
//! here, although display formatting uses it.

use chrono::{NaiveDate, Timelike};

use crate::model::{DailyForecast, ForecastSample};

/// Upper bound on the number of days returned.
pub const MAX_FORECAST_DAYS: usize = 5;

/// Hour of day a representative sample should be closest to.
pub const MIDDAY_HOUR: i64 = 12;

/// Pick one representative sample per UTC day, at most [`MAX_FORECAST_DAYS`] of them.
///
/// Days appear in the order their first sample occurs in `samples`, which the
/// provider delivers chronologically. Within a day the sample whose UTC hour is
/// nearest to noon wins; on a tie the earliest sample is kept.
pub fn select_daily_representatives(samples: &[ForecastSample]) -> Vec<DailyForecast> {
    group_by_utc_day(samples)
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .filter_map(|(_, day)| {
            closest_to_midday(&day)
                .or_else(|| day.first().copied())
                .map(|sample| DailyForecast(sample.clone()))
        })
        .collect()
}

fn group_by_utc_day(samples: &[ForecastSample]) -> Vec<(NaiveDate, Vec<&ForecastSample>)> {
    let mut groups: Vec<(NaiveDate, Vec<&ForecastSample>)> = Vec::new();

    for sample in samples {
        let Some(date) = sample.time().map(|t| t.date_naive()) else {
            tracing::debug!(timestamp = sample.timestamp, "skipping sample with unrepresentable timestamp");
            continue;
        };

        match groups.iter_mut().find(|(d, _)| *d == date) {
            Some((_, day)) => day.push(sample),
            None => groups.push((date, vec![sample])),
        }
    }

    groups
}

/// Left-to-right fold: a later sample only replaces the current best on strict improvement.
fn closest_to_midday<'a>(day: &[&'a ForecastSample]) -> Option<&'a ForecastSample> {
    day.iter()
        .filter_map(|sample| distance_from_midday(sample).map(|d| (*sample, d)))
        .fold(None::<(&ForecastSample, i64)>, |best, (sample, diff)| match best {
            Some((_, best_diff)) if diff >= best_diff => best,
            _ => Some((sample, diff)),
        })
        .map(|(sample, _)| sample)
}

fn distance_from_midday(sample: &ForecastSample) -> Option<i64> {
    sample
        .time()
        .map(|t| (i64::from(t.hour()) - MIDDAY_HOUR).abs())
}
