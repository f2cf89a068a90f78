use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/pacemap`, or the platform data dir without a HOME
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("pacemap"))
        } else {
            ProjectDirs::from("", "", "pacemap").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("workouts.db"))
            .unwrap_or_else(|| PathBuf::from("pacemap_workouts.db"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("pacemap.log"))
            .unwrap_or_else(|| PathBuf::from("pacemap.log"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "pacemap")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("pacemap_config.json"))
    }
}
