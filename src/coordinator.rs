use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::error::{AppError, GeolocationError, PersistenceError};
use crate::map::MapView;
use crate::persistence::{BlobStore, WorkoutPersistence};
use crate::session::SessionStore;
use crate::validator::{validate, WorkoutForm};
use crate::workout::{Location, Workout, WorkoutId};

pub const DEFAULT_ZOOM_LEVEL: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortState {
    Unsorted,
    Sorted,
}

/// Everything the host can tell the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    LocationResolved(Result<Location, GeolocationError>),
    LocationPicked(Location),
    Submit,
    ListItemClicked(WorkoutId),
    SortClicked,
}

/// Session-scoped state with a single owner
#[derive(Debug)]
pub struct SessionContext<M: MapView> {
    /// Absent until the startup position request succeeds
    pub map: Option<M>,
    pub workouts: SessionStore,
    pub pending_location: Option<Location>,
}

impl<M: MapView> Default for SessionContext<M> {
    fn default() -> Self {
        Self {
            map: None,
            workouts: SessionStore::new(),
            pending_location: None,
        }
    }
}

/// Drives form visibility, sorting, and the displayed list from host events
#[derive(Debug)]
pub struct ViewCoordinator<M: MapView, S: BlobStore> {
    context: SessionContext<M>,
    persistence: WorkoutPersistence<S>,
    form: FormState,
    draft: WorkoutForm,
    sort: SortState,
    // displayed list order, top first; may diverge from store order
    displayed: Vec<WorkoutId>,
    alert: Option<String>,
    zoom_level: u8,
    clock: fn() -> DateTime<Local>,
}

impl<M: MapView, S: BlobStore> ViewCoordinator<M, S> {
    /// Hydrates from `persistence` and renders the list. A failed load starts empty.
    pub fn start(persistence: WorkoutPersistence<S>, zoom_level: u8) -> Self {
        let mut coordinator = Self {
            context: SessionContext::default(),
            persistence,
            form: FormState::Hidden,
            draft: WorkoutForm::default(),
            sort: SortState::Unsorted,
            displayed: Vec::new(),
            alert: None,
            zoom_level,
            clock: Local::now,
        };
        coordinator.hydrate();
        coordinator
    }

    /// Replace the creation timestamp source
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    fn hydrate(&mut self) {
        let workouts = match self.persistence.load() {
            Ok(workouts) => workouts,
            Err(err) => {
                tracing::warn!(%err, "could not load stored workouts, starting empty");
                Vec::new()
            }
        };
        tracing::info!(count = workouts.len(), "hydrated session");

        self.context.workouts.replace_all(workouts);
        self.displayed.clear();
        for workout in self.context.workouts.iter() {
            self.displayed.insert(0, workout.id().clone());
        }
    }

    pub fn handle(&mut self, event: ViewEvent) -> Result<(), AppError> {
        match event {
            ViewEvent::LocationResolved(outcome) => {
                self.location_resolved(outcome);
                Ok(())
            }
            ViewEvent::LocationPicked(location) => {
                self.pick_location(location);
                Ok(())
            }
            ViewEvent::Submit => self.submit().map(|_| ()),
            ViewEvent::ListItemClicked(id) => {
                self.select(&id);
                Ok(())
            }
            ViewEvent::SortClicked => {
                self.toggle_sort();
                Ok(())
            }
        }
    }

    /// Startup position outcome: build the map and replay markers, or degrade
    pub fn location_resolved(&mut self, outcome: Result<Location, GeolocationError>) {
        match outcome {
            Ok(center) => {
                let mut map = M::initialize(center, self.zoom_level);
                for workout in self.context.workouts.iter() {
                    render_marker(&mut map, workout);
                }
                self.context.map = Some(map);
            }
            Err(err) => {
                self.alert = Some(err.to_string());
            }
        }
    }

    pub fn pick_location(&mut self, location: Location) {
        self.context.pending_location = Some(location);
        self.form = FormState::Visible;
    }

    /// Creates a workout from the draft and the pending location.
    ///
    /// A save failure is returned after the workout has been kept and rendered.
    pub fn submit(&mut self) -> Result<WorkoutId, AppError> {
        let workout = match validate(&self.draft, self.context.pending_location, (self.clock)()) {
            Ok(workout) => workout,
            Err(err) => {
                tracing::debug!(%err, "rejected workout form");
                self.alert = Some(err.to_string());
                return Err(err.into());
            }
        };
        let id = workout.id().clone();
        tracing::info!(id = %id, description = workout.description(), "workout created");

        if let Some(map) = self.context.map.as_mut() {
            render_marker(map, &workout);
        }
        self.displayed.insert(0, id.clone());
        self.context.workouts.append(workout);
        self.context.pending_location = None;
        self.draft.clear();
        self.form = FormState::Hidden;

        if let Err(err) = self.persistence.save(&self.context.workouts) {
            tracing::error!(%err, "workout kept in memory but not saved");
            self.alert = Some(format!("Workout not saved: {err}"));
            return Err(err.into());
        }
        Ok(id)
    }

    /// Pans the map to the workout. Returns whether a pan happened.
    pub fn select(&mut self, id: &WorkoutId) -> bool {
        let Some(workout) = self.context.workouts.find_by_id(id) else {
            return false;
        };
        let Some(map) = self.context.map.as_mut() else {
            return false;
        };
        map.pan_to(workout.location(), self.zoom_level, true);
        true
    }

    /// Reorders the displayed list by distance: ascending when entering
    /// `Sorted`, descending when leaving it
    pub fn toggle_sort(&mut self) {
        let ascending = self.sort == SortState::Unsorted;
        let store = &self.context.workouts;
        let distance = |id: &WorkoutId| store.find_by_id(id).map_or(0.0, |w| w.distance_km());

        self.displayed = self
            .displayed
            .iter()
            .cloned()
            .sorted_by(|a, b| {
                let cmp = distance(a)
                    .partial_cmp(&distance(b))
                    .unwrap_or(std::cmp::Ordering::Equal);
                if ascending {
                    cmp
                } else {
                    cmp.reverse()
                }
            })
            .collect();

        self.sort = if ascending {
            SortState::Sorted
        } else {
            SortState::Unsorted
        };
    }

    /// Erases the persisted session and hands back the store for a fresh start
    pub fn reset(mut self) -> Result<S, PersistenceError> {
        self.persistence.clear()?;
        tracing::info!("session reset, reloading");
        Ok(self.close())
    }

    /// Ends the session without touching storage
    pub fn close(self) -> S {
        self.persistence.into_store()
    }

    pub fn form_state(&self) -> FormState {
        self.form
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn form(&self) -> &WorkoutForm {
        &self.draft
    }

    pub fn form_mut(&mut self) -> &mut WorkoutForm {
        &mut self.draft
    }

    pub fn pending_location(&self) -> Option<Location> {
        self.context.pending_location
    }

    pub fn workouts(&self) -> &SessionStore {
        &self.context.workouts
    }

    pub fn map(&self) -> Option<&M> {
        self.context.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut M> {
        self.context.map.as_mut()
    }

    pub fn persistence(&self) -> &WorkoutPersistence<S> {
        &self.persistence
    }

    pub fn zoom_level(&self) -> u8 {
        self.zoom_level
    }

    /// Workouts in displayed order, top first
    pub fn displayed(&self) -> Vec<&Workout> {
        self.displayed
            .iter()
            .filter_map(|id| self.context.workouts.find_by_id(id))
            .collect()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }
}

fn render_marker<M: MapView>(map: &mut M, workout: &Workout) {
    map.add_marker(
        workout.location(),
        &workout.popup_text(),
        workout.kind().popup_class(),
    );
}
