use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_FORECAST_HOURS: u32 = 168;

/// Outbound HTTP behavior shared by both providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Nominatim rejects requests without a descriptive agent.
    pub user_agent: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "tourinfo/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/tourinfo/tourinfo)"
            )
            .to_string(),
            timeout_secs: 10,
            cache_ttl_secs: 3600,
            max_retries: 5,
            backoff_factor: 0.2,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geocoding: String,
    pub forecast: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: "https://nominatim.openstreetmap.org/search".to_string(),
            forecast: "https://api.open-meteo.com/v1/forecast".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_place = "Baia Mare"
/// forecast_hours = 168
///
/// [http]
/// cache_ttl_secs = 3600
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the location/forecast documents and the HTTP cache live.
    pub data_dir: Option<PathBuf>,
    pub default_place: Option<String>,
    pub forecast_hours: u32,
    pub http: HttpConfig,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_place: None,
            forecast_hours: DEFAULT_FORECAST_HOURS,
            http: HttpConfig::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Place to use when none is given on the command line.
    pub fn place_or_default(&self, place: Option<String>) -> Result<String> {
        place
            .or_else(|| self.default_place.clone())
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No place given and no default place configured.\n\
                     Hint: pass a place name or run `tourinfo configure` first."
                )
            })
    }

    /// Resolved data directory: the configured one, or the platform default.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "tourinfo", "tourinfo")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}
