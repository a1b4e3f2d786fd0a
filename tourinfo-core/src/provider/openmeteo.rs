//! Hourly forecasts from Open-Meteo.
//!
//! The provider answers in columns: one array per variable plus the sample
//! instants. The series is rebuilt from a `(start, end, interval)` triple and
//! the columns are zipped by position, so every column must have exactly one
//! value per generated instant.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    model::{Coordinates, ForecastSeries, HourlyRecord},
    provider::{fetch_body, parse_body},
    store::PersistedStore,
    transport::{HttpRequest, Transport},
};

/// Requested hourly variables, in the order the columns are read back.
pub const HOURLY_VARIABLES: [&str; 15] = [
    "temperature_2m",
    "relative_humidity_2m",
    "dew_point_2m",
    "apparent_temperature",
    "precipitation_probability",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "snow_depth",
    "visibility",
    "wind_speed_10m",
    "uv_index",
    "uv_index_clear_sky",
    "is_day",
];

const DEFAULT_INTERVAL_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<i64>,
    #[serde(flatten)]
    variables: HashMap<String, Vec<Option<f64>>>,
}

/// Columnar hourly data: `[start, end)` stepped by `interval` seconds, plus
/// one column per entry of [`HOURLY_VARIABLES`], in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyFrame {
    pub start: i64,
    pub end: i64,
    pub interval: i64,
    pub columns: Vec<Vec<f64>>,
}

impl HourlyFrame {
    fn from_block(block: HourlyBlock) -> Result<Self> {
        let HourlyBlock {
            time,
            mut variables,
        } = block;

        let Some(&start) = time.first() else {
            return Err(Error::NoData);
        };
        let out_of_range = || Error::malformed("time axis out of range");
        let interval = match time.get(1) {
            Some(second) => second.checked_sub(start).ok_or_else(out_of_range)?,
            None => DEFAULT_INTERVAL_SECS,
        };
        let end = i64::try_from(time.len())
            .ok()
            .and_then(|n| interval.checked_mul(n))
            .and_then(|span| start.checked_add(span))
            .ok_or_else(out_of_range)?;

        let columns = HOURLY_VARIABLES
            .iter()
            .map(|name| {
                variables
                    .remove(*name)
                    .map(|values| values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
                    .ok_or_else(|| Error::malformed(format!("variable '{name}' is missing")))
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        Ok(Self {
            start,
            end,
            interval,
            columns,
        })
    }

    /// Instants of the half-open range `[start, end)`.
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>> {
        if self.interval <= 0 {
            return Err(Error::malformed(format!(
                "non-positive interval of {}s",
                self.interval
            )));
        }

        (self.start..self.end)
            .step_by(self.interval as usize)
            .map(|secs| {
                DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| Error::malformed(format!("instant {secs} out of range")))
            })
            .collect()
    }

    /// Zip the generated instants with the columns, position by position.
    pub fn into_series(self) -> Result<ForecastSeries> {
        if self.columns.len() != HOURLY_VARIABLES.len() {
            return Err(Error::malformed(format!(
                "expected {} variables, got {}",
                HOURLY_VARIABLES.len(),
                self.columns.len()
            )));
        }

        let timestamps = self.timestamps()?;
        for (name, column) in HOURLY_VARIABLES.iter().zip(&self.columns) {
            if column.len() != timestamps.len() {
                return Err(Error::malformed(format!(
                    "variable '{name}' has {} values for {} time steps",
                    column.len(),
                    timestamps.len()
                )));
            }
        }

        let c = &self.columns;
        let records = timestamps
            .into_iter()
            .enumerate()
            .map(|(i, timestamp)| HourlyRecord {
                timestamp,
                temperature_c: c[0][i],
                relative_humidity_pct: c[1][i],
                dew_point_c: c[2][i],
                apparent_temperature_c: c[3][i],
                precipitation_probability_pct: c[4][i],
                precipitation_mm: c[5][i],
                rain_mm: c[6][i],
                showers_mm: c[7][i],
                snowfall_cm: c[8][i],
                snow_depth_m: c[9][i],
                visibility_m: c[10][i],
                wind_speed_kmh: c[11][i],
                uv_index: c[12][i],
                uv_index_clear_sky: c[13][i],
                is_day: c[14][i].is_finite() && c[14][i] != 0.0,
            })
            .collect();

        Ok(ForecastSeries::from_records(records))
    }
}

/// Fetches hourly forecasts and persists the latest series.
#[derive(Debug)]
pub struct ForecastFetcher {
    endpoint: String,
    transport: Box<dyn Transport>,
    store: PersistedStore,
}

impl ForecastFetcher {
    pub fn new(
        endpoint: impl Into<String>,
        transport: impl Transport + 'static,
        store: PersistedStore,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: Box::new(transport),
            store,
        }
    }

    /// Fetch `horizon_hours` of forecast at `coordinates` and replace the
    /// persisted series with it.
    ///
    /// On any error the previously persisted series is left as it was.
    pub async fn fetch(
        &self,
        coordinates: Coordinates,
        horizon_hours: u32,
    ) -> Result<ForecastSeries> {
        if horizon_hours == 0 {
            return Err(Error::InvalidInput(
                "forecast horizon must be at least one hour".into(),
            ));
        }
        if coordinates.is_degenerate() {
            warn!("Fetching forecast for degenerate coordinates (0, 0)");
        }

        info!(%coordinates, horizon_hours, "Fetching weather data");
        let request = HttpRequest::get(&self.endpoint)
            .query("latitude", coordinates.latitude)
            .query("longitude", coordinates.longitude)
            .query("hourly", HOURLY_VARIABLES.join(","))
            .query("timezone", "auto")
            .query("forecast_hours", horizon_hours)
            .query("timeformat", "unixtime");

        let body = fetch_body(self.transport.as_ref(), &request, "forecast").await?;
        let response: ForecastResponse = parse_body(&body, "forecast")?;

        let frame = response
            .hourly
            .ok_or(Error::NoData)
            .and_then(HourlyFrame::from_block);
        if let Err(Error::NoData) = &frame {
            warn!("No weather data returned");
        }
        let frame = frame?;
        debug!(
            start = frame.start,
            end = frame.end,
            interval = frame.interval,
            "Rebuilding hourly series"
        );

        let series = frame.into_series()?;
        info!(records = series.len(), "Weather data fetched");

        self.store.write_forecast(&series)?;
        Ok(series)
    }
}
