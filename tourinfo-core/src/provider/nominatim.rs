//! Forward geocoding through Nominatim (OpenStreetMap).

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    model::{Location, NOT_AVAILABLE},
    provider::{fetch_body, parse_body},
    store::PersistedStore,
    transport::{HttpRequest, Transport},
};

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: Option<String>,
    lat: Option<Value>,
    lon: Option<Value>,
    #[serde(rename = "type")]
    place_type: Option<String>,
    address: Option<NominatimAddress>,
    boundingbox: Option<Vec<Value>>,
    osm_id: Option<Value>,
    extratags: Option<HashMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    country_code: Option<String>,
    postcode: Option<String>,
}

impl NominatimPlace {
    fn into_location(self) -> Result<Location> {
        let latitude = self
            .lat
            .as_ref()
            .and_then(number)
            .ok_or_else(|| Error::malformed(format!("unusable latitude {:?}", self.lat)))?;
        let longitude = self
            .lon
            .as_ref()
            .and_then(number)
            .ok_or_else(|| Error::malformed(format!("unusable longitude {:?}", self.lon)))?;

        let bounding_box = self
            .boundingbox
            .as_deref()
            .and_then(|raw| {
                let parsed: Option<Vec<f64>> = raw.iter().map(number).collect();
                <[f64; 4]>::try_from(parsed?).ok()
            })
            .unwrap_or([latitude, latitude, longitude, longitude]);

        let address = self.address.unwrap_or_default();
        let population = self
            .extratags
            .as_ref()
            .and_then(|tags| tags.get("population"))
            .and_then(population);

        Ok(Location {
            display_name: or_sentinel(self.display_name),
            latitude,
            longitude,
            place_type: or_sentinel(self.place_type),
            country_code: or_sentinel(address.country_code),
            postcode: or_sentinel(address.postcode),
            bounding_box,
            external_id: or_sentinel(self.osm_id.as_ref().and_then(text)),
            population,
        })
    }
}

/// Turns place names into [`Location`]s and persists the latest one.
#[derive(Debug)]
pub struct LocationResolver {
    endpoint: String,
    user_agent: String,
    transport: Box<dyn Transport>,
    store: PersistedStore,
}

impl LocationResolver {
    pub fn new(
        endpoint: impl Into<String>,
        user_agent: impl Into<String>,
        transport: impl Transport + 'static,
        store: PersistedStore,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
            transport: Box::new(transport),
            store,
        }
    }

    /// Geocode `query`, keeping only the best match, and overwrite the
    /// persisted location with it.
    ///
    /// Nothing is written unless a match was found and normalized.
    pub async fn resolve(&self, query: &str) -> Result<Location> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::NotFound {
                query: query.to_string(),
            });
        }

        info!(query, "Geocoding location");
        let request = HttpRequest::get(&self.endpoint)
            .query("q", query)
            .query("format", "json")
            .query("limit", 1)
            .query("addressdetails", 1)
            .query("extratags", 1)
            .header("User-Agent", &self.user_agent);

        let body = fetch_body(self.transport.as_ref(), &request, "geocoding").await?;
        let places: Vec<NominatimPlace> = parse_body(&body, "geocoding")?;

        let Some(place) = places.into_iter().next() else {
            warn!(query, "Location not found");
            return Err(Error::NotFound {
                query: query.to_string(),
            });
        };

        let location = place.into_location()?;
        info!(
            name = %location.display_name,
            lat = location.latitude,
            lon = location.longitude,
            "Location resolved"
        );

        self.store.write_location(&location)?;
        Ok(location)
    }
}

fn or_sentinel(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Nominatim sends coordinates as strings; accept numbers too.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// OSM population tags are free text ("12345", "12 345", "12,345").
fn population(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| !matches!(c, ' ' | ',' | '_' | '\u{a0}'))
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}
