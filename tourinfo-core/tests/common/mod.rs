//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use tourinfo_core::{PersistedStore, ReqwestTransport, provider::HOURLY_VARIABLES};

pub const USER_AGENT: &str = "tourinfo-tests/0.1 (tests@example.org)";

/// 2025-03-01T00:00:00Z
pub const START: i64 = 1_740_787_200;

pub fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(10), USER_AGENT).unwrap()
}

pub fn store() -> (tempfile::TempDir, PersistedStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistedStore::new(dir.path().join("data"));
    (dir, store)
}

/// Nominatim answer for Baia Mare, trimmed to the fields that matter.
pub fn baia_mare() -> Value {
    json!([{
        "place_id": 86718345,
        "licence": "Data © OpenStreetMap contributors, ODbL 1.0. http://osm.org/copyright",
        "osm_type": "relation",
        "osm_id": 2407451,
        "lat": "47.6571945",
        "lon": "23.5680173",
        "class": "boundary",
        "type": "administrative",
        "place_rank": 12,
        "importance": 0.58,
        "addresstype": "city",
        "name": "Baia Mare",
        "display_name": "Baia Mare, Maramureș, 430000, România",
        "address": {
            "city": "Baia Mare",
            "county": "Maramureș",
            "postcode": "430000",
            "country": "România",
            "country_code": "ro"
        },
        "extratags": { "population": "123738", "wikidata": "Q170207" },
        "boundingbox": ["47.6047480", "47.7353920", "23.4640580", "23.6713370"]
    }])
}

/// Open-Meteo JSON answer with `hours` samples from [`START`], every
/// column of length `hours` except those listed in `short`, which get one less.
///
/// Column `k` holds `k + (hour of day) / 2`, which stays exact through JSON.
pub fn forecast_body(hours: usize, short: &[&str]) -> Value {
    let mut hourly = serde_json::Map::new();
    let time: Vec<i64> = (0..hours as i64).map(|h| START + h * 3600).collect();
    hourly.insert("time".into(), json!(time));

    for (k, name) in HOURLY_VARIABLES.iter().enumerate() {
        let len = if short.contains(name) { hours - 1 } else { hours };
        let values: Vec<Value> = (0..len)
            .map(|i| match *name {
                "is_day" => json!(u8::from((6..18).contains(&(i % 24)))),
                _ => json!(k as f64 + (i % 24) as f64 * 0.5),
            })
            .collect();
        hourly.insert((*name).into(), Value::Array(values));
    }

    json!({
        "latitude": 47.66,
        "longitude": 23.57,
        "generationtime_ms": 0.123,
        "utc_offset_seconds": 7200,
        "timezone": "Europe/Bucharest",
        "timezone_abbreviation": "EET",
        "elevation": 228.0,
        "hourly_units": { "time": "unixtime" },
        "hourly": Value::Object(hourly)
    })
}
