use anyhow::Result;
use tracing::{error, info};

use crate::{
    config::Config,
    model::{ForecastSeries, Location},
    provider::{ForecastFetcher, LocationResolver},
    store::PersistedStore,
    transport::{Cached, ReqwestTransport, Retrying, cache::CACHE_FILE},
};

/// What one pipeline run produced. A `None` stage failed and was logged.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub location: Option<Location>,
    pub forecast: Option<ForecastSeries>,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.location.is_some() && self.forecast.is_some()
    }
}

/// Runs geocoding, then forecasting from whatever coordinates are persisted.
#[derive(Debug)]
pub struct Pipeline {
    resolver: LocationResolver,
    fetcher: ForecastFetcher,
    store: PersistedStore,
}

impl Pipeline {
    pub fn new(resolver: LocationResolver, fetcher: ForecastFetcher, store: PersistedStore) -> Self {
        Self {
            resolver,
            fetcher,
            store,
        }
    }

    /// Wire up both providers against the configured endpoints and data dir.
    ///
    /// Forecast requests go through the on-disk response cache; geocoding
    /// requests only get retries.
    pub fn from_config(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let store = PersistedStore::new(&data_dir);
        let http = &config.http;
        let raw = ReqwestTransport::from_config(http)?;

        let resolver = LocationResolver::new(
            &config.endpoints.geocoding,
            &http.user_agent,
            Retrying::from_config(raw.clone(), http),
            store.clone(),
        );
        let fetcher = ForecastFetcher::new(
            &config.endpoints.forecast,
            Cached::new(
                Retrying::from_config(raw, http),
                data_dir.join(CACHE_FILE),
                http.cache_ttl(),
            ),
            store.clone(),
        );

        Ok(Self::new(resolver, fetcher, store))
    }

    pub fn store(&self) -> &PersistedStore {
        &self.store
    }

    /// Resolve `query`, then fetch `horizon_hours` of forecast.
    ///
    /// Stage failures never abort the run: a failed resolution leaves the
    /// forecast stage to use previously persisted (or degenerate) coordinates.
    pub async fn run(&self, query: &str, horizon_hours: u32) -> PipelineReport {
        let location = match self.resolver.resolve(query).await {
            Ok(location) => Some(location),
            Err(e) => {
                error!("Location lookup for '{query}' failed: {e}");
                None
            }
        };

        let forecast = self.refresh_forecast(horizon_hours).await;

        info!(
            location = location.is_some(),
            forecast = forecast.is_some(),
            "Pipeline run finished"
        );
        PipelineReport { location, forecast }
    }

    /// Forecast stage only, for the persisted coordinates.
    pub async fn refresh_forecast(&self, horizon_hours: u32) -> Option<ForecastSeries> {
        let coordinates = self.store.read_coordinates();
        match self.fetcher.fetch(coordinates, horizon_hours).await {
            Ok(series) => Some(series),
            Err(e) => {
                error!("Error while fetching weather data: {e}");
                None
            }
        }
    }
}
