//! Core library for the `tourinfo` dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - Geocoding (Nominatim) and hourly forecasts (Open-Meteo)
//! - The file-backed documents both stages hand to the display layer
//! - The pipeline that runs the two stages in order
//!
//! It is used by `tourinfo-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod lock;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod store;
pub mod summary;
pub mod transport;

pub use config::{Config, Endpoints, HttpConfig};
pub use error::{Error, Result};
pub use lock::InstanceLock;
pub use model::{Coordinates, ForecastSeries, HourlyRecord, Location};
pub use pipeline::{Pipeline, PipelineReport};
pub use provider::{ForecastFetcher, LocationResolver};
pub use store::{DocumentKind, PersistedStore};
pub use summary::{DailySummary, daily_summaries};
pub use transport::{Cached, ReqwestTransport, Retrying, Transport};
