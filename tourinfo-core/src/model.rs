use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel written for location fields the geocoder did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// A geocoded place, as persisted in the location document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place_type: String,
    pub country_code: String,
    pub postcode: String,
    /// `[south, north, west, east]`, in the geocoder's order.
    pub bounding_box: [f64; 4],
    pub external_id: String,
    #[serde(default, with = "population")]
    pub population: Option<u64>,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Used when no location has been resolved yet.
    pub const DEGENERATE: Coordinates = Coordinates {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        *self == Self::DEGENERATE
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}°N {:.4}°E", self.latitude, self.longitude)
    }
}

/// One hour of forecast. Values the provider left empty are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    #[serde(rename = "date", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "nan_if_null")]
    pub temperature_c: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub relative_humidity_pct: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub dew_point_c: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub apparent_temperature_c: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub precipitation_probability_pct: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub precipitation_mm: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub rain_mm: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub showers_mm: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub snowfall_cm: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub snow_depth_m: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub visibility_m: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub wind_speed_kmh: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub uv_index: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub uv_index_clear_sky: f64,
    pub is_day: bool,
}

/// Time-ordered hourly records, evenly spaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSeries {
    records: Vec<HourlyRecord>,
}

impl ForecastSeries {
    pub fn from_records(records: Vec<HourlyRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[HourlyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<HourlyRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&HourlyRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&HourlyRecord> {
        self.records.last()
    }

    /// Spacing between consecutive records, if there are at least two.
    pub fn interval(&self) -> Option<Duration> {
        match self.records.as_slice() {
            [first, second, ..] => Some(second.timestamp - first.timestamp),
            _ => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HourlyRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a ForecastSeries {
    type Item = &'a HourlyRecord;
    type IntoIter = std::slice::Iter<'a, HourlyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Population is written as an integer, or as the "N/A" sentinel when unknown.
mod population {
    use super::NOT_AVAILABLE;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Count(u64),
        Text(String),
    }

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(count) => serializer.serialize_u64(*count),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Count(count)) => Some(count),
            Some(Raw::Text(text)) => text.trim().parse().ok(),
            None => None,
        })
    }
}
