use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latitude/longitude pair, stored as `[lat, lng]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Location {
    fn from(v: [f64; 2]) -> Self {
        Location { lat: v[0], lng: v[1] }
    }
}

impl From<Location> for [f64; 2] {
    fn from(l: Location) -> Self {
        [l.lat, l.lng]
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn toggled(self) -> Self {
        match self {
            WorkoutKind::Running => WorkoutKind::Cycling,
            WorkoutKind::Cycling => WorkoutKind::Running,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃",
            WorkoutKind::Cycling => "🚴",
        }
    }

    /// Style class attached to map markers of this kind
    pub fn popup_class(self) -> &'static str {
        match self {
            WorkoutKind::Running => "running-popup",
            WorkoutKind::Cycling => "cycling-popup",
        }
    }
}

/// Opaque workout identifier, stable for the life of the record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn generate() -> Self {
        WorkoutId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        WorkoutId(s.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific payload. The `kind` tag selects the variant on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Metrics {
    #[serde(rename_all = "camelCase")]
    Running {
        cadence_spm: u32,
        pace_min_per_km: f64,
    },
    #[serde(rename_all = "camelCase")]
    Cycling {
        elevation_gain_m: f64,
        speed_kmh: f64,
    },
}

/// A recorded workout.
///
/// Derived values (pace or speed, description) are computed once by the
/// constructors and stored as plain data. Records decoded from storage carry
/// the same fields and are read exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<Local>,
    distance_km: f64,
    duration_min: f64,
    location: Location,
    description: String,
    #[serde(flatten)]
    metrics: Metrics,
}

impl Workout {
    pub fn running(distance_km: f64, duration_min: f64, location: Location, cadence_spm: u32) -> Self {
        Self::running_at(distance_km, duration_min, location, cadence_spm, Local::now())
    }

    pub fn running_at(
        distance_km: f64,
        duration_min: f64,
        location: Location,
        cadence_spm: u32,
        created_at: DateTime<Local>,
    ) -> Self {
        let metrics = Metrics::Running {
            cadence_spm,
            pace_min_per_km: duration_min / distance_km,
        };
        Self::build(distance_km, duration_min, location, metrics, created_at)
    }

    pub fn cycling(distance_km: f64, duration_min: f64, location: Location, elevation_gain_m: f64) -> Self {
        Self::cycling_at(distance_km, duration_min, location, elevation_gain_m, Local::now())
    }

    pub fn cycling_at(
        distance_km: f64,
        duration_min: f64,
        location: Location,
        elevation_gain_m: f64,
        created_at: DateTime<Local>,
    ) -> Self {
        let metrics = Metrics::Cycling {
            elevation_gain_m,
            speed_kmh: distance_km / (duration_min / 60.0),
        };
        Self::build(distance_km, duration_min, location, metrics, created_at)
    }

    fn build(
        distance_km: f64,
        duration_min: f64,
        location: Location,
        metrics: Metrics,
        created_at: DateTime<Local>,
    ) -> Self {
        let kind = match metrics {
            Metrics::Running { .. } => WorkoutKind::Running,
            Metrics::Cycling { .. } => WorkoutKind::Cycling,
        };
        Self {
            id: WorkoutId::generate(),
            description: describe(kind, &created_at),
            created_at,
            distance_km,
            duration_min,
            location,
            metrics,
        }
    }

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn kind(&self) -> WorkoutKind {
        match self.metrics {
            Metrics::Running { .. } => WorkoutKind::Running,
            Metrics::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    /// Stored pace (running only)
    pub fn pace_min_per_km(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Running { pace_min_per_km, .. } => Some(pace_min_per_km),
            Metrics::Cycling { .. } => None,
        }
    }

    /// Stored speed (cycling only)
    pub fn speed_kmh(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Cycling { speed_kmh, .. } => Some(speed_kmh),
            Metrics::Running { .. } => None,
        }
    }

    /// Headline metric with its unit, e.g. `(5.0, "min/km")`
    pub fn rate(&self) -> (f64, &'static str) {
        match self.metrics {
            Metrics::Running { pace_min_per_km, .. } => (pace_min_per_km, "min/km"),
            Metrics::Cycling { speed_kmh, .. } => (speed_kmh, "km/h"),
        }
    }

    /// Kind-specific secondary value with its unit: cadence or elevation gain
    pub fn detail(&self) -> (f64, &'static str) {
        match self.metrics {
            Metrics::Running { cadence_spm, .. } => (cadence_spm as f64, "spm"),
            Metrics::Cycling { elevation_gain_m, .. } => (elevation_gain_m, "m"),
        }
    }

    /// Whether every numeric field survives a JSON round trip
    pub fn is_finite(&self) -> bool {
        [
            self.distance_km,
            self.duration_min,
            self.location.lat,
            self.location.lng,
            self.rate().0,
            self.detail().0,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Marker popup text: icon plus description
    pub fn popup_text(&self) -> String {
        format!("{} {}", self.kind().icon(), self.description)
    }
}

/// `<Kind> on <Month> <day>` in local time
pub fn describe(kind: WorkoutKind, at: &DateTime<Local>) -> String {
    format!("{} on {} {}", kind, at.format("%B"), at.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn march_9() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap()
    }

    #[test]
    fn running_pace_is_duration_over_distance() {
        let w = Workout::running_at(5.0, 25.0, Location::new(39.0, -12.0), 180, march_9());
        assert_eq!(w.pace_min_per_km(), Some(5.0));
        assert_eq!(w.speed_kmh(), None);
        assert_eq!(w.kind(), WorkoutKind::Running);
        assert_eq!(w.detail(), (180.0, "spm"));
    }

    #[test]
    fn cycling_speed_is_km_per_hour() {
        let w = Workout::cycling_at(20.0, 60.0, Location::new(39.0, -12.0), 400.0, march_9());
        assert_eq!(w.speed_kmh(), Some(20.0));
        assert_eq!(w.pace_min_per_km(), None);
        assert_eq!(w.rate(), (20.0, "km/h"));
    }

    #[test]
    fn derived_metrics_for_fractional_inputs() {
        let w = Workout::running_at(5.2, 24.0, Location::new(0.0, 0.0), 178, march_9());
        assert!((w.pace_min_per_km().unwrap() - 24.0 / 5.2).abs() < 1e-12);

        let c = Workout::cycling_at(27.0, 95.0, Location::new(0.0, 0.0), -5.0, march_9());
        assert!((c.speed_kmh().unwrap() - 27.0 / (95.0 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn description_uses_capitalized_kind_and_date() {
        let r = Workout::running_at(1.0, 1.0, Location::new(0.0, 0.0), 1, march_9());
        assert_eq!(r.description(), "Running on March 9");

        let dec = Local.with_ymd_and_hms(2023, 12, 31, 8, 0, 0).unwrap();
        let c = Workout::cycling_at(1.0, 1.0, Location::new(0.0, 0.0), 0.0, dec);
        assert_eq!(c.description(), "Cycling on December 31");
    }

    #[test]
    fn identical_inputs_give_distinct_ids() {
        let a = Workout::running_at(5.0, 25.0, Location::new(1.0, 2.0), 180, march_9());
        let b = Workout::running_at(5.0, 25.0, Location::new(1.0, 2.0), 180, march_9());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.description(), b.description());
    }

    #[test]
    fn serialized_shape_is_flat_and_tagged() {
        let w = Workout::running_at(5.0, 25.0, Location::new(39.0, -12.0), 180, march_9());
        let v = serde_json::to_value(&w).unwrap();
        assert_eq!(v["kind"], "running");
        assert_eq!(v["distanceKm"], 5.0);
        assert_eq!(v["durationMin"], 25.0);
        assert_eq!(v["cadenceSpm"], 180);
        assert_eq!(v["paceMinPerKm"], 5.0);
        assert_eq!(v["location"], serde_json::json!([39.0, -12.0]));
        assert_eq!(v["description"], "Running on March 9");
        assert!(v.get("speedKmh").is_none());
    }

    #[test]
    fn stored_derived_values_are_read_not_recomputed() {
        // A hand-edited record whose pace disagrees with distance/duration
        let raw = r#"{
            "id": "abc",
            "createdAt": "2024-03-09T10:30:00+00:00",
            "distanceKm": 5.0,
            "durationMin": 25.0,
            "location": [39.0, -12.0],
            "description": "Running on March 9",
            "kind": "running",
            "cadenceSpm": 180,
            "paceMinPerKm": 7.5
        }"#;
        let w: Workout = serde_json::from_str(raw).unwrap();
        assert_eq!(w.pace_min_per_km(), Some(7.5));
        assert_eq!(w.id().as_str(), "abc");
    }

    #[test]
    fn overflowing_speed_is_not_finite() {
        let w = Workout::cycling_at(1e308, 1.0, Location::new(0.0, 0.0), 0.0, march_9());
        assert_eq!(w.speed_kmh(), Some(f64::INFINITY));
        assert!(!w.is_finite());
        assert!(Workout::running_at(5.0, 25.0, Location::new(0.0, 0.0), 180, march_9()).is_finite());
    }

    #[test]
    fn kind_presentation() {
        assert_eq!(WorkoutKind::Running.to_string(), "Running");
        assert_eq!(WorkoutKind::Cycling.popup_class(), "cycling-popup");
        assert_eq!(WorkoutKind::Running.toggled(), WorkoutKind::Cycling);
    }
}
