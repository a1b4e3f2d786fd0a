//! Daily aggregates of an hourly series, for compact display.

use chrono::NaiveDate;

use crate::model::{ForecastSeries, HourlyRecord};

/// At most this many days are summarized; older ones are dropped.
pub const MAX_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Number of hourly records that fell on this day.
    pub hours: usize,
    pub temperature_mean_c: f64,
    pub temperature_min_c: f64,
    pub temperature_max_c: f64,
    pub relative_humidity_mean_pct: f64,
    pub wind_speed_mean_kmh: f64,
    pub uv_index_mean: f64,
    pub precipitation_probability_max_pct: f64,
    pub precipitation_total_mm: f64,
}

impl DailySummary {
    fn from_hours(date: NaiveDate, hours: &[&HourlyRecord]) -> Self {
        let values = |f: fn(&HourlyRecord) -> f64| {
            hours.iter().map(move |r| f(*r)).filter(|v| !v.is_nan())
        };

        Self {
            date,
            hours: hours.len(),
            temperature_mean_c: mean(values(|r| r.temperature_c)),
            temperature_min_c: values(|r| r.temperature_c).fold(f64::NAN, f64::min),
            temperature_max_c: values(|r| r.temperature_c).fold(f64::NAN, f64::max),
            relative_humidity_mean_pct: mean(values(|r| r.relative_humidity_pct)),
            wind_speed_mean_kmh: mean(values(|r| r.wind_speed_kmh)),
            uv_index_mean: mean(values(|r| r.uv_index)),
            precipitation_probability_max_pct: values(|r| r.precipitation_probability_pct)
                .fold(f64::NAN, f64::max),
            precipitation_total_mm: values(|r| r.precipitation_mm).sum(),
        }
    }

    /// Fewer than 24 hourly records, e.g. the trailing day of a series.
    pub fn is_partial(&self) -> bool {
        self.hours < 24
    }
}

/// Group records by UTC calendar day, keeping the last [`MAX_DAYS`] days.
///
/// Series of any length are accepted; a trailing partial day is kept as is.
pub fn daily_summaries(series: &ForecastSeries) -> Vec<DailySummary> {
    let mut days: Vec<DailySummary> = Vec::new();
    let mut current: Vec<&HourlyRecord> = Vec::new();

    for record in series {
        let date = record.timestamp.date_naive();
        if let Some(first) = current.first() {
            if first.timestamp.date_naive() != date {
                days.push(DailySummary::from_hours(
                    first.timestamp.date_naive(),
                    &current,
                ));
                current.clear();
            }
        }
        current.push(record);
    }
    if let Some(first) = current.first() {
        days.push(DailySummary::from_hours(first.timestamp.date_naive(), &current));
    }

    let skip = days.len().saturating_sub(MAX_DAYS);
    days.split_off(skip)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
