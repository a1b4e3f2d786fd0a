//! File-backed handoff between the fetch stages and whatever displays the data.
//!
//! Each document is replaced wholesale: the new content is written to a
//! temporary file in the same directory and renamed over the target, so a
//! reader sees either the old document or the new one, never a mix.

use std::{
    fs,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    model::{Coordinates, ForecastSeries, HourlyRecord, Location},
};

pub const LOCATION_FILE: &str = "location_data.json";
pub const FORECAST_FILE: &str = "weather_data.json";

/// Which persisted document to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Location,
    Forecast,
}

impl DocumentKind {
    pub fn file_name(self) -> &'static str {
        match self {
            DocumentKind::Location => LOCATION_FILE,
            DocumentKind::Forecast => FORECAST_FILE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PersistedStore {
    dir: PathBuf,
}

impl PersistedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Replace the location document with a pretty-printed JSON object.
    pub fn write_location(&self, location: &Location) -> Result<()> {
        let path = self.path(DocumentKind::Location);
        replace_file(&path, |out| {
            serde_json::to_writer_pretty(&mut *out, location).map_err(std::io::Error::other)?;
            out.write_all(b"\n")
        })?;
        info!(path = %path.display(), "Location data saved");
        Ok(())
    }

    /// Replace the forecast document with one JSON object per line.
    pub fn write_forecast(&self, series: &ForecastSeries) -> Result<()> {
        let path = self.path(DocumentKind::Forecast);
        replace_file(&path, |out| {
            for record in series {
                serde_json::to_writer(&mut *out, record).map_err(std::io::Error::other)?;
                out.write_all(b"\n")?;
            }
            Ok(())
        })?;
        info!(path = %path.display(), records = series.len(), "Weather data saved");
        Ok(())
    }

    /// `Ok(None)` when no location has been persisted yet.
    pub fn read_location(&self) -> Result<Option<Location>> {
        let path = self.path(DocumentKind::Location);
        let Some(contents) = read_if_present(&path)? else {
            return Ok(None);
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| Error::Corrupt { path, source })
    }

    /// `Ok(None)` when no forecast has been persisted yet.
    pub fn read_forecast(&self) -> Result<Option<ForecastSeries>> {
        let path = self.path(DocumentKind::Forecast);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, e)),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::io(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: HourlyRecord = serde_json::from_str(&line).map_err(|source| {
                Error::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
            records.push(record);
        }

        Ok(Some(ForecastSeries::from_records(records)))
    }

    /// Coordinates of the persisted location, or [`Coordinates::DEGENERATE`]
    /// when there is none or it cannot be read.
    pub fn read_coordinates(&self) -> Coordinates {
        match self.read_location() {
            Ok(Some(location)) => {
                let coordinates = location.coordinates();
                debug!(%coordinates, "Loaded coordinates from location data");
                coordinates
            }
            Ok(None) => {
                warn!(
                    path = %self.path(DocumentKind::Location).display(),
                    "No location data persisted; using degenerate coordinates"
                );
                Coordinates::DEGENERATE
            }
            Err(e) => {
                warn!("Error getting location data: {e}; using degenerate coordinates");
                Coordinates::DEGENERATE
            }
        }
    }
}

/// Replace `path` by writing a temporary file next to it and renaming it
/// over the target. Parent directories are created as needed.
pub(crate) fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    {
        let mut out = BufWriter::new(&mut tmp);
        write(&mut out).map_err(|e| Error::io(path, e))?;
        out.flush().map_err(|e| Error::io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io(path, e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

fn read_if_present(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}
