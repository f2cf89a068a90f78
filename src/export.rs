use serde::Serialize;
use std::io::Write;

use crate::error::ExportError;
use crate::workout::{Metrics, Workout};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    created_at: String,
    kind: &'a str,
    description: &'a str,
    lat: f64,
    lng: f64,
    distance_km: f64,
    duration_min: f64,
    cadence_spm: Option<u32>,
    pace_min_per_km: Option<f64>,
    elevation_gain_m: Option<f64>,
    speed_kmh: Option<f64>,
}

impl<'a> From<&'a Workout> for CsvRow<'a> {
    fn from(w: &'a Workout) -> Self {
        let (cadence_spm, pace_min_per_km, elevation_gain_m, speed_kmh) = match *w.metrics() {
            Metrics::Running {
                cadence_spm,
                pace_min_per_km,
            } => (Some(cadence_spm), Some(pace_min_per_km), None, None),
            Metrics::Cycling {
                elevation_gain_m,
                speed_kmh,
            } => (None, None, Some(elevation_gain_m), Some(speed_kmh)),
        };
        let location = w.location();
        CsvRow {
            id: w.id().as_str(),
            created_at: w.created_at().to_rfc3339(),
            kind: match w.metrics() {
                Metrics::Running { .. } => "running",
                Metrics::Cycling { .. } => "cycling",
            },
            description: w.description(),
            lat: location.lat,
            lng: location.lng,
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            cadence_spm,
            pace_min_per_km,
            elevation_gain_m,
            speed_kmh,
        }
    }
}

/// Writes one CSV row per workout, header first
pub fn write_csv<W: Write>(workouts: &[Workout], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for workout in workouts {
        wtr.serialize(CsvRow::from(workout))?;
    }
    wtr.flush()?;
    Ok(())
}

/// One line per workout: `🏃 Running on March 9  5 km  25 min  5.0 min/km  180 spm`
pub fn summary_line(w: &Workout) -> String {
    let (rate, rate_unit) = w.rate();
    let (detail, detail_unit) = w.detail();
    format!(
        "{} {}  {} km  {} min  {:.1} {}  {} {}",
        w.kind().icon(),
        w.description(),
        w.distance_km(),
        w.duration_min(),
        rate,
        rate_unit,
        detail,
        detail_unit
    )
}

pub fn write_list<W: Write>(workouts: &[Workout], mut writer: W) -> Result<(), ExportError> {
    if workouts.is_empty() {
        writeln!(writer, "No workouts recorded yet")?;
        return Ok(());
    }
    for workout in workouts {
        writeln!(writer, "{}", summary_line(workout))?;
    }
    Ok(())
}
