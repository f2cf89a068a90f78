use assert_matches::assert_matches;
use chrono::{DateTime, Datelike, Local, TimeZone};

use pacemap::coordinator::{FormState, ViewCoordinator, ViewEvent, DEFAULT_ZOOM_LEVEL};
use pacemap::error::{AppError, CreateError, PersistenceError};
use pacemap::map::{MapView, TerminalMap};
use pacemap::persistence::{
    BlobStore, MemoryBlobStore, SqliteBlobStore, WorkoutPersistence, WORKOUTS_KEY,
};
use pacemap::workout::{Location, WorkoutKind};

fn fixed_now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 21, 18, 0, 0).unwrap()
}

fn coordinator<S: BlobStore>(store: S) -> ViewCoordinator<TerminalMap, S> {
    ViewCoordinator::start(WorkoutPersistence::new(store), DEFAULT_ZOOM_LEVEL).with_clock(fixed_now)
}

/// Blob store whose writes always fail
#[derive(Debug, Default)]
struct ReadOnlyStore {
    inner: MemoryBlobStore,
}

impl BlobStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        self.inner.get(key)
    }

    fn set(&mut self, _key: &str, _bytes: &[u8]) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::other("disk full")))
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.inner.remove(key)
    }
}

#[test]
fn running_scenario_persists_one_record() {
    let mut c = coordinator(MemoryBlobStore::new());
    c.handle(ViewEvent::LocationPicked(Location::new(39.0, -12.0))).unwrap();
    {
        let form = c.form_mut();
        form.kind = WorkoutKind::Running;
        form.distance = "5".into();
        form.duration = "25".into();
        form.cadence = "180".into();
    }
    c.handle(ViewEvent::Submit).unwrap();

    assert_eq!(c.workouts().len(), 1);
    let w = &c.workouts().all()[0];
    assert_eq!(w.pace_min_per_km(), Some(5.0));
    assert_eq!(
        w.description(),
        format!("Running on {} {}", fixed_now().format("%B"), fixed_now().day())
    );
    assert_eq!(w.description(), "Running on June 21");

    let blob = c.persistence().store().get(WORKOUTS_KEY).unwrap().unwrap();
    let records: serde_json::Value = serde_json::from_slice(&blob).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "running");
    assert_eq!(records[0]["location"], serde_json::json!([39.0, -12.0]));
}

#[test]
fn cycling_scenario_computes_speed() {
    let mut c = coordinator(MemoryBlobStore::new());
    c.pick_location(Location::new(39.0, -12.0));
    {
        let form = c.form_mut();
        form.kind = WorkoutKind::Cycling;
        form.distance = "20".into();
        form.duration = "60".into();
        form.elevation = "400".into();
    }
    let id = c.submit().unwrap();
    let w = c.workouts().find_by_id(&id).unwrap();
    assert_eq!(w.speed_kmh(), Some(20.0));
    assert_eq!(w.detail(), (400.0, "m"));
}

#[test]
fn submit_without_pick_reports_missing_location() {
    let mut c = coordinator(MemoryBlobStore::new());
    c.form_mut().distance = "5".into();
    c.form_mut().duration = "25".into();
    c.form_mut().cadence = "180".into();

    assert_matches!(
        c.handle(ViewEvent::Submit),
        Err(AppError::Create(CreateError::MissingLocation))
    );
    assert!(c.workouts().is_empty());
    assert!(!c.persistence().store().contains(WORKOUTS_KEY));
}

#[test]
fn pending_location_is_consumed_by_creation() {
    let mut c = coordinator(MemoryBlobStore::new());
    c.pick_location(Location::new(39.0, -12.0));
    c.form_mut().distance = "5".into();
    c.form_mut().duration = "25".into();
    c.form_mut().cadence = "180".into();
    c.submit().unwrap();

    c.form_mut().distance = "5".into();
    c.form_mut().duration = "25".into();
    c.form_mut().cadence = "180".into();
    assert_matches!(
        c.submit(),
        Err(AppError::Create(CreateError::MissingLocation))
    );
    assert_eq!(c.workouts().len(), 1);
}

#[test]
fn rejected_form_leaves_store_and_blob_untouched() {
    let mut c = coordinator(MemoryBlobStore::new());
    c.pick_location(Location::new(1.0, 1.0));
    c.form_mut().distance = "-3".into();
    c.form_mut().duration = "20".into();
    c.form_mut().cadence = "160".into();

    assert_matches!(
        c.handle(ViewEvent::Submit),
        Err(AppError::Create(CreateError::InvalidInput(_)))
    );
    assert!(c.workouts().is_empty());
    assert_eq!(c.form_state(), FormState::Visible);
    assert_eq!(c.pending_location(), Some(Location::new(1.0, 1.0)));
    assert!(!c.persistence().store().contains(WORKOUTS_KEY));
}

#[test]
fn overflowing_speed_is_rejected_and_history_survives_restart() {
    let mut c = coordinator(MemoryBlobStore::new());
    c.pick_location(Location::new(39.0, -12.0));
    c.form_mut().distance = "5".into();
    c.form_mut().duration = "25".into();
    c.form_mut().cadence = "180".into();
    c.submit().unwrap();

    c.pick_location(Location::new(39.0, -12.0));
    {
        let form = c.form_mut();
        form.kind = WorkoutKind::Cycling;
        form.distance = "1e308".into();
        form.duration = "1".into();
        form.elevation = "0".into();
    }
    assert_matches!(
        c.submit(),
        Err(AppError::Create(CreateError::InvalidInput(_)))
    );
    assert_eq!(c.workouts().len(), 1);
    assert_eq!(c.form_state(), FormState::Visible);

    let saved = c.workouts().clone();
    let next = coordinator(c.close());
    assert_eq!(next.workouts(), &saved);
}

#[test]
fn hydration_restores_store_and_reverses_display() {
    let mut first = coordinator(MemoryBlobStore::new());
    for (kind, distance) in [(WorkoutKind::Running, "5"), (WorkoutKind::Cycling, "20")] {
        first.pick_location(Location::new(39.0, -12.0));
        let form = first.form_mut();
        form.kind = kind;
        form.distance = distance.into();
        form.duration = "30".into();
        form.cadence = "170".into();
        first.submit().unwrap();
    }
    let saved = first.workouts().clone();
    let store = first.close();

    let second = coordinator(store);
    assert_eq!(second.workouts(), &saved);
    let shown: Vec<f64> = second.displayed().iter().map(|w| w.distance_km()).collect();
    assert_eq!(shown, vec![20.0, 5.0]);
    // no map yet, but the list is available
    assert!(second.map().is_none());
}

#[test]
fn corrupt_storage_hydrates_empty() {
    let mut store = MemoryBlobStore::new();
    store.set(WORKOUTS_KEY, b"this is not json").unwrap();
    let c = coordinator(store);
    assert!(c.workouts().is_empty());
    assert!(c.displayed().is_empty());
}

#[test]
fn save_failure_keeps_workout_in_memory() {
    let mut c = coordinator(ReadOnlyStore::default());
    c.location_resolved(Ok(Location::new(39.0, -12.0)));
    c.pick_location(Location::new(39.0, -12.0));
    c.form_mut().distance = "5".into();
    c.form_mut().duration = "25".into();
    c.form_mut().cadence = "180".into();

    assert_matches!(c.submit(), Err(AppError::Persistence(_)));
    assert_eq!(c.workouts().len(), 1);
    assert_eq!(c.displayed().len(), 1);
    assert_eq!(c.map().unwrap().markers().len(), 1);
    assert_eq!(c.form_state(), FormState::Hidden);
    assert!(c.alert().unwrap().starts_with("Workout not saved"));
}

#[test]
fn reset_erases_blob_and_next_start_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.db");

    let mut c = coordinator(SqliteBlobStore::open(&path).unwrap());
    c.pick_location(Location::new(39.0, -12.0));
    c.form_mut().distance = "5".into();
    c.form_mut().duration = "25".into();
    c.form_mut().cadence = "180".into();
    c.submit().unwrap();

    let store = c.reset().unwrap();
    assert_eq!(store.get(WORKOUTS_KEY).unwrap(), None);

    let reloaded = coordinator(SqliteBlobStore::open(&path).unwrap());
    assert!(reloaded.workouts().is_empty());
    assert!(WorkoutPersistence::new(store).load().unwrap().is_empty());
}

/// Blob store that can neither write nor delete
#[derive(Debug, Default)]
struct LockedStore {
    inner: MemoryBlobStore,
}

impl BlobStore for LockedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        self.inner.get(key)
    }

    fn set(&mut self, _key: &str, _bytes: &[u8]) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::other("read-only database")))
    }

    fn remove(&mut self, _key: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::other("read-only database")))
    }
}

#[test]
fn failed_reset_is_reported() {
    let c = coordinator(LockedStore::default());
    let err = c.reset().unwrap_err();
    assert_eq!(err.to_string(), "Storage I/O failure: read-only database");
}

#[test]
fn terminal_map_collaborator_contract() {
    let mut map = TerminalMap::initialize(Location::new(39.0, -12.0), DEFAULT_ZOOM_LEVEL);
    map.add_marker(Location::new(39.0, -12.0), "🏃 Running on June 21", "running-popup");
    map.pan_to(Location::new(40.0, -11.0), DEFAULT_ZOOM_LEVEL, true);
    assert_eq!(map.center(), Location::new(40.0, -11.0));
    assert_eq!(map.markers().len(), 1);
}
