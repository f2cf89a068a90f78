use chrono::{DateTime, Local};

use crate::error::CreateError;
use crate::workout::{Location, Workout, WorkoutKind};

/// Raw form state as typed by the user
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutForm {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        Self {
            kind: WorkoutKind::Running,
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
        }
    }
}

impl WorkoutForm {
    pub fn new(kind: WorkoutKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Empties the numeric fields; the kind selector keeps its value
    pub fn clear(&mut self) {
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();
    }

    pub fn toggle_kind(&mut self) {
        self.kind = self.kind.toggled();
    }
}

/// Reads a form field as a number. Blank reads as zero; garbage reads as NaN.
fn read_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn all_positive(values: &[f64]) -> bool {
    values.iter().all(|v| *v > 0.0)
}

/// Validate `form` against the pending location and build the workout.
///
/// Distance and duration must be finite and positive for both kinds. Running
/// cadence must be finite and positive; cycling elevation only finite, so
/// zero and negative gains are accepted. The derived pace or speed must come
/// out finite as well.
pub fn validate(
    form: &WorkoutForm,
    pending: Option<Location>,
    created_at: DateTime<Local>,
) -> Result<Workout, CreateError> {
    let location = pending.ok_or(CreateError::MissingLocation)?;

    let distance = read_number(&form.distance);
    let duration = read_number(&form.duration);

    let workout = match form.kind {
        WorkoutKind::Running => {
            let cadence = read_number(&form.cadence);
            if !all_finite(&[distance, duration, cadence])
                || !all_positive(&[distance, duration, cadence])
            {
                return Err(invalid(form));
            }
            // sub-step cadences round up to one
            let cadence_spm = (cadence.round() as u32).max(1);
            Workout::running_at(distance, duration, location, cadence_spm, created_at)
        }
        WorkoutKind::Cycling => {
            let elevation = read_number(&form.elevation);
            if !all_finite(&[distance, duration, elevation]) || !all_positive(&[distance, duration]) {
                return Err(invalid(form));
            }
            Workout::cycling_at(distance, duration, location, elevation, created_at)
        }
    };

    // huge distance over tiny duration (or the reverse) overflows the rate
    if !workout.rate().0.is_finite() {
        return Err(invalid(form));
    }
    Ok(workout)
}

fn invalid(form: &WorkoutForm) -> CreateError {
    let third = match form.kind {
        WorkoutKind::Running => format!("cadence {:?}", form.cadence),
        WorkoutKind::Cycling => format!("elevation {:?}", form.elevation),
    };
    CreateError::InvalidInput(format!(
        "distance {:?}, duration {:?}, {}",
        form.distance, form.duration, third
    ))
}
