use std::sync::mpsc::Sender;
use std::thread;

use crate::error::GeolocationError;
use crate::workout::Location;

/// One-shot position provider
pub trait Geolocator: Send + 'static {
    fn request_location(&self) -> Result<Location, GeolocationError>;
}

/// Answers with a configured position, or declines when none is set
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGeolocator {
    location: Option<Location>,
}

impl StaticGeolocator {
    pub fn new(location: Option<Location>) -> Self {
        Self { location }
    }
}

impl Geolocator for StaticGeolocator {
    fn request_location(&self) -> Result<Location, GeolocationError> {
        self.location.ok_or(GeolocationError::Unavailable)
    }
}

/// Resolves the position on a helper thread and delivers the single outcome
/// through `tx`, mapped by `wrap`. No retry, no timeout.
pub fn request_in_background<G, E, F>(geolocator: G, tx: Sender<E>, wrap: F)
where
    G: Geolocator,
    E: Send + 'static,
    F: FnOnce(Result<Location, GeolocationError>) -> E + Send + 'static,
{
    thread::spawn(move || {
        let outcome = geolocator.request_location();
        match &outcome {
            Ok(location) => tracing::info!(%location, "position resolved"),
            Err(err) => tracing::warn!(%err, "position unavailable"),
        }
        let _ = tx.send(wrap(outcome));
    });
}
