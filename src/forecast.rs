//! Forecast aggregation
//!
//! Collapses the provider's 3-hourly forecast series into a short hourly
//! outlook and per-day summaries. Aggregation is a pure function of the
//! sample sequence and the time zone used to decide calendar days.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike};
use thiserror::Error;

use crate::data::{DailySummary, ForecastView, HourlyEntry, RawForecastSample};

/// Default number of hourly entries (24 hours at 3-hour spacing)
pub const DEFAULT_HOURLY_LIMIT: usize = 8;

/// Default number of daily summaries
pub const DEFAULT_DAILY_LIMIT: usize = 5;

/// Errors that can occur while aggregating a forecast
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    /// The provider returned an empty forecast
    #[error("forecast contains no samples")]
    NoSamples,

    /// A sample timestamp is outside the representable date range
    #[error("invalid sample timestamp: {0}")]
    InvalidTimestamp(i64),

    /// A day bucket without samples reached the summary step
    #[error("day bucket for {0} has no samples")]
    EmptyBucket(NaiveDate),
}

/// Output size limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastLimits {
    /// Maximum number of hourly entries (a count, not a duration)
    pub hourly: usize,
    /// Maximum number of daily summaries
    pub daily: usize,
}

impl Default for ForecastLimits {
    fn default() -> Self {
        Self {
            hourly: DEFAULT_HOURLY_LIMIT,
            daily: DEFAULT_DAILY_LIMIT,
        }
    }
}

/// Samples sharing one calendar day, in sample order
#[derive(Debug, Clone, PartialEq)]
struct DayBucket {
    date: NaiveDate,
    temps: Vec<f64>,
    conditions: Vec<String>,
    icons: Vec<String>,
}

impl DayBucket {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            temps: Vec::new(),
            conditions: Vec::new(),
            icons: Vec::new(),
        }
    }

    fn push(&mut self, sample: &RawForecastSample) {
        self.temps.push(sample.temp);
        self.conditions.push(sample.condition.clone());
        self.icons.push(sample.icon.clone());
    }
}

/// Aggregates a forecast series into the hourly outlook and daily summaries
///
/// Calendar days and hour labels are computed in `tz`. An empty series is an
/// error rather than an empty forecast.
pub fn aggregate<Tz: TimeZone>(
    samples: &[RawForecastSample],
    limits: ForecastLimits,
    tz: &Tz,
) -> Result<ForecastView, AggregateError> {
    if samples.is_empty() {
        return Err(AggregateError::NoSamples);
    }

    let hourly = hourly_slice(samples, limits.hourly, tz)?;
    let buckets = bucket_by_day(samples, tz)?;
    let daily = summarize_days(&buckets, limits.daily)?;

    Ok(ForecastView { hourly, daily })
}

fn local_time<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Result<DateTime<Tz>, AggregateError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(tz))
        .ok_or(AggregateError::InvalidTimestamp(timestamp))
}

/// Groups samples by local calendar day, keeping first-occurrence day order
fn bucket_by_day<Tz: TimeZone>(
    samples: &[RawForecastSample],
    tz: &Tz,
) -> Result<Vec<DayBucket>, AggregateError> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for sample in samples {
        let date = local_time(sample.timestamp, tz)?.date_naive();
        let slot = *index.entry(date).or_insert_with(|| {
            buckets.push(DayBucket::new(date));
            buckets.len() - 1
        });
        buckets[slot].push(sample);
    }

    Ok(buckets)
}

/// Takes the first `limit` samples as hourly entries
fn hourly_slice<Tz: TimeZone>(
    samples: &[RawForecastSample],
    limit: usize,
    tz: &Tz,
) -> Result<Vec<HourlyEntry>, AggregateError> {
    samples
        .iter()
        .take(limit)
        .map(|sample| {
            let hour = local_time(sample.timestamp, tz)?.hour();
            Ok(HourlyEntry {
                timestamp: sample.timestamp,
                hour,
                label: format!("{}:00", hour),
                temp: sample.temp,
                condition: sample.condition.to_lowercase(),
                icon: sample.icon.clone(),
            })
        })
        .collect()
}

/// Reduces the first `limit` day buckets to daily summaries
fn summarize_days(buckets: &[DayBucket], limit: usize) -> Result<Vec<DailySummary>, AggregateError> {
    buckets
        .iter()
        .take(limit)
        .map(|bucket| {
            let empty = || AggregateError::EmptyBucket(bucket.date);
            let (min_temp, max_temp) = temperature_range(&bucket.temps).ok_or_else(empty)?;
            let condition = dominant_condition(&bucket.conditions).ok_or_else(empty)?;
            let icon = bucket.icons.first().ok_or_else(empty)?;

            Ok(DailySummary {
                date: bucket.date,
                weekday: bucket.date.format("%a").to_string(),
                month_day: bucket.date.format("%b %-d").to_string(),
                max_temp,
                min_temp,
                condition: condition.to_lowercase(),
                icon: icon.clone(),
            })
        })
        .collect()
}

/// Returns `(min, max)` of the temperatures, or `None` when empty
fn temperature_range(temps: &[f64]) -> Option<(f64, f64)> {
    let (first, rest) = temps.split_first()?;
    Some(
        rest.iter()
            .fold((*first, *first), |(lo, hi), &t| (lo.min(t), hi.max(t))),
    )
}

/// Most frequent label; ties go to the label seen first
fn dominant_condition(conditions: &[String]) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for condition in conditions {
        match counts.iter_mut().find(|(label, _)| *label == condition.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((condition.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}
