//! Plain-text rendering of the persisted documents.

use std::fmt::Write;

use tourinfo_core::{
    DailySummary, ForecastSeries, Location, PersistedStore, daily_summaries, model::NOT_AVAILABLE,
};

pub fn location(location: &Location) -> String {
    let population = location
        .population
        .map_or_else(|| NOT_AVAILABLE.to_string(), |p| p.to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Location: {}", location.display_name);
    let _ = writeln!(
        out,
        "  country: {}   postcode: {}   type: {}",
        location.country_code, location.postcode, location.place_type
    );
    let _ = writeln!(out, "  coordinates: {}", location.coordinates());
    let _ = writeln!(out, "  population: {population}");
    out
}

pub fn forecast(series: &ForecastSeries) -> String {
    let mut out = String::new();
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        let _ = writeln!(out, "Forecast: no records");
        return out;
    };

    let _ = writeln!(
        out,
        "Forecast: {} hourly records, {} .. {} UTC",
        series.len(),
        first.timestamp.format("%Y-%m-%d %H:%M"),
        last.timestamp.format("%Y-%m-%d %H:%M"),
    );
    let _ = writeln!(
        out,
        "  {:<12} {:>7} {:>7} {:>7} {:>6} {:>8} {:>6} {:>5}",
        "day", "min °C", "avg °C", "max °C", "hum %", "wind", "rain %", "uv"
    );
    for day in daily_summaries(series) {
        out.push_str(&day_row(&day));
    }
    out
}

fn day_row(day: &DailySummary) -> String {
    let partial = if day.is_partial() {
        format!(" ({}h)", day.hours)
    } else {
        String::new()
    };
    format!(
        "  {:<12} {:>7.1} {:>7.1} {:>7.1} {:>6.0} {:>8.1} {:>6.0} {:>5.1}{partial}\n",
        day.date.format("%a %d %b").to_string(),
        day.temperature_min_c,
        day.temperature_mean_c,
        day.temperature_max_c,
        day.relative_humidity_mean_pct,
        day.wind_speed_mean_kmh,
        day.precipitation_probability_max_pct,
        day.uv_index_mean,
    )
}

/// Everything in the store, with placeholders for missing or unreadable documents.
pub fn persisted(store: &PersistedStore) -> String {
    let mut out = String::new();
    match store.read_location() {
        Ok(Some(loc)) => out.push_str(&location(&loc)),
        Ok(None) => out.push_str("No location data available. Run `tourinfo fetch <place>`.\n"),
        Err(e) => {
            let _ = writeln!(out, "Warning: location data unusable: {e}");
        }
    }
    match store.read_forecast() {
        Ok(Some(series)) => out.push_str(&forecast(&series)),
        Ok(None) => out.push_str("No weather data available.\n"),
        Err(e) => {
            let _ = writeln!(out, "Warning: weather data unusable: {e}");
        }
    }
    out
}
