use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use tourinfo_core::{
    Config, InstanceLock, PersistedStore, Pipeline, PipelineReport, lock::LOCK_FILE,
};
use tracing::{info, warn};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tourinfo", version, about = "Location and weather forecast dashboard")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a place and fetch its hourly forecast once.
    Fetch {
        /// Place name; defaults to the configured default place.
        place: Option<String>,

        /// Forecast horizon in hours.
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Print the persisted location and forecast.
    Show,

    /// Fetch, then keep the forecast fresh until interrupted.
    Watch {
        /// Place name; defaults to the configured default place.
        place: Option<String>,

        /// Forecast horizon in hours.
        #[arg(long)]
        hours: Option<u32>,

        /// Minutes between forecast refreshes.
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        every: u64,
    },

    /// Set the default place, horizon and contact User-Agent.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Fetch { place, hours } => {
                let place = config.place_or_default(place)?;
                let pipeline = Pipeline::from_config(&config)?;
                let report = pipeline
                    .run(&place, hours.unwrap_or(config.forecast_hours))
                    .await;
                print_report(&report);
                if !report.is_complete() {
                    bail!("Pipeline finished with missing data; see the log above");
                }
            }
            Command::Show => {
                let store = PersistedStore::new(config.data_dir()?);
                print!("{}", render::persisted(&store));
            }
            Command::Watch {
                place,
                hours,
                every,
            } => {
                let place = config.place_or_default(place)?;
                let hours = hours.unwrap_or(config.forecast_hours);
                watch(&config, &place, hours, Duration::from_secs(every * 60)).await?;
            }
            Command::Configure => configure(config, self.config)?,
        }

        Ok(())
    }
}

/// Run the pipeline, then refresh the forecast every `every` until Ctrl-C.
///
/// Only one watcher runs per data directory; the lock is released when this
/// function returns, interrupted or not.
async fn watch(config: &Config, place: &str, hours: u32, every: Duration) -> Result<()> {
    let data_dir = config.data_dir()?;
    let Some(_lock) = InstanceLock::acquire(data_dir.join(LOCK_FILE))? else {
        println!(
            "tourinfo is already watching (lock file {}). Skipping...",
            data_dir.join(LOCK_FILE).display()
        );
        return Ok(());
    };

    let pipeline = Pipeline::from_config(config)?;
    let refresh = async {
        print_report(&pipeline.run(place, hours).await);
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match pipeline.refresh_forecast(hours).await {
                Some(series) => info!(records = series.len(), "Forecast refreshed"),
                None => warn!("Forecast refresh failed; keeping previous data"),
            }
        }
    };

    tokio::select! {
        _ = refresh => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            println!("Ctrl-C detected. Cleaning up...");
        }
    }

    Ok(())
}

fn configure(mut config: Config, path: Option<PathBuf>) -> Result<()> {
    let place = Text::new("Default place:")
        .with_default(config.default_place.as_deref().unwrap_or(""))
        .prompt()?;
    config.default_place = Some(place.trim().to_string()).filter(|p| !p.is_empty());

    config.forecast_hours = CustomType::<u32>::new("Forecast horizon (hours):")
        .with_default(config.forecast_hours)
        .with_error_message("Please enter a whole number of hours")
        .prompt()?;

    let user_agent = Text::new("User-Agent sent to the geocoder (include contact info):")
        .with_default(&config.http.user_agent)
        .prompt()?;
    config.http.user_agent = user_agent;

    let saved_to = match path {
        Some(path) => {
            config.save_to(&path)?;
            path
        }
        None => config.save()?,
    };
    println!("Configuration saved to {}", saved_to.display());
    Ok(())
}

fn print_report(report: &PipelineReport) {
    match &report.location {
        Some(location) => print!("{}", render::location(location)),
        None => println!("No location resolved."),
    }
    match &report.forecast {
        Some(series) => print!("{}", render::forecast(series)),
        None => println!("No weather data fetched."),
    }
}
