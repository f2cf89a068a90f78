use crate::workout::WorkoutId;

/// Reasons a submitted form cannot become a workout
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreateError {
    #[error("Pick a location on the map first!")]
    MissingLocation,
    #[error("Inputs have to be positive numbers! ({0})")]
    InvalidInput(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Could not get your position")]
    Unavailable,
    #[error("Could not get your position: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage failure: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("Could not encode or decode workouts: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("Workout {0} has a value that cannot be stored")]
    NonFinite(WorkoutId),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Export I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Create(#[from] CreateError),
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
