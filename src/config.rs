use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::coordinator::DEFAULT_ZOOM_LEVEL;
use crate::workout::Location;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Zoom used when the map opens and when panning to a workout
    pub zoom_level: u8,
    /// Position reported at startup; without one the map stays unavailable
    pub home: Option<Location>,
    /// Overrides the default workouts database location
    pub database: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM_LEVEL,
            home: None,
            database: None,
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(AppDirs::db_path)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            zoom_level: 15,
            home: Some(Location::new(52.52, 13.405)),
            database: Some(dir.path().join("w.db")),
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_broken_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "home": [39.0, -12.0] }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.zoom_level, DEFAULT_ZOOM_LEVEL);
        assert_eq!(cfg.home, Some(Location::new(39.0, -12.0)));
    }
}
