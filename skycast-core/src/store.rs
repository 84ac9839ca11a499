//! Local key-value persistence: one JSON file per entry.
//!
//! Two entries exist, mirroring the keys of the app this replaces:
//! `lastWeather` (the most recent successful lookup) and `savedLocations`
//! (the ordered search history).

use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::{fs, io, path::PathBuf};

use crate::error::{Error, Result};
use crate::model::{SavedLocations, WeatherRecord};

pub const LAST_WEATHER: &str = "lastWeather";
pub const SAVED_LOCATIONS: &str = "savedLocations";

#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Store under the platform data directory.
    pub fn open() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| Error::Config("Could not determine platform data directory".into()))?;

        Ok(Self::at(dirs.data_dir()))
    }

    /// Store rooted at an explicit directory. Used by tests.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn last_weather(&self) -> Result<Option<WeatherRecord>> {
        self.read_entry(LAST_WEATHER)
    }

    pub fn save_last_weather(&self, record: &WeatherRecord) -> Result<()> {
        self.write_entry(LAST_WEATHER, record)
    }

    pub fn saved_locations(&self) -> Result<Option<SavedLocations>> {
        self.read_entry(SAVED_LOCATIONS)
    }

    pub fn save_saved_locations(&self, locations: &SavedLocations) -> Result<()> {
        self.write_entry(SAVED_LOCATIONS, locations)
    }

    pub fn clear_saved_locations(&self) -> Result<()> {
        self.remove_entry(SAVED_LOCATIONS)
    }

    fn entry_path(&self, entry: &str) -> PathBuf {
        self.dir.join(format!("{entry}.json"))
    }

    /// Absent entries are `Ok(None)`; a present-but-corrupt entry is an
    /// error the caller decides about (startup logs it and moves on).
    fn read_entry<T: DeserializeOwned>(&self, entry: &str) -> Result<Option<T>> {
        let path = self.entry_path(entry);

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::store(entry, e)),
        };

        let value = serde_json::from_str(&contents).map_err(|e| Error::store(entry, e))?;
        Ok(Some(value))
    }

    fn write_entry<T: Serialize>(&self, entry: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::store(entry, e))?;

        let json = serde_json::to_string(value).map_err(|e| Error::store(entry, e))?;
        fs::write(self.entry_path(entry), json).map_err(|e| Error::store(entry, e))
    }

    fn remove_entry(&self, entry: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(entry)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::store(entry, e)),
        }
    }
}
