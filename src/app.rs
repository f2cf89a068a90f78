use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::coordinator::{FormState, ViewCoordinator, ViewEvent};
use crate::map::{osm_url, TerminalMap};
use crate::persistence::BlobStore;
use crate::runtime::AppEvent;
use crate::workout::{Location, WorkoutKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Map,
    Form,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Kind,
    Distance,
    Duration,
    /// cadence for running, elevation gain for cycling
    Extra,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Kind => FormField::Distance,
            FormField::Distance => FormField::Duration,
            FormField::Duration => FormField::Extra,
            FormField::Extra => FormField::Kind,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Kind => FormField::Extra,
            FormField::Distance => FormField::Kind,
            FormField::Duration => FormField::Distance,
            FormField::Extra => FormField::Duration,
        }
    }
}

/// What the outer loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
    /// Erase stored workouts and start over from empty
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStatus {
    Locating,
    Ready,
    Unavailable,
}

/// Terminal host around the coordinator: focus, list cursor, status line
#[derive(Debug)]
pub struct App<S: BlobStore> {
    coordinator: ViewCoordinator<TerminalMap, S>,
    pub focus: Focus,
    pub field: FormField,
    pub selected: usize,
    pub map_status: MapStatus,
    pub status: Option<String>,
}

impl<S: BlobStore> App<S> {
    pub fn new(coordinator: ViewCoordinator<TerminalMap, S>) -> Self {
        let focus = if coordinator.workouts().is_empty() {
            Focus::Map
        } else {
            Focus::List
        };
        Self {
            coordinator,
            focus,
            field: FormField::Distance,
            selected: 0,
            map_status: MapStatus::Locating,
            status: None,
        }
    }

    /// Start with a message already on the status line
    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn coordinator(&self) -> &ViewCoordinator<TerminalMap, S> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut ViewCoordinator<TerminalMap, S> {
        &mut self.coordinator
    }

    pub fn into_coordinator(self) -> ViewCoordinator<TerminalMap, S> {
        self.coordinator
    }

    pub fn on_event(&mut self, event: AppEvent) -> Action {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Located(outcome) => {
                self.map_status = if outcome.is_ok() {
                    MapStatus::Ready
                } else {
                    MapStatus::Unavailable
                };
                self.dispatch(ViewEvent::LocationResolved(outcome));
                Action::Continue
            }
            AppEvent::Resize | AppEvent::Tick => Action::Continue,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        self.status = None;

        match self.focus {
            Focus::Map => self.on_map_key(key),
            Focus::Form => self.on_form_key(key),
            Focus::List => self.on_list_key(key),
        }
    }

    fn on_map_key(&mut self, key: KeyEvent) -> Action {
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up => self.with_map(|m| m.move_cursor(step, 0)),
            KeyCode::Down => self.with_map(|m| m.move_cursor(-step, 0)),
            KeyCode::Left => self.with_map(|m| m.move_cursor(0, -step)),
            KeyCode::Right => self.with_map(|m| m.move_cursor(0, step)),
            KeyCode::Char('+') | KeyCode::Char('=') => self.with_map(TerminalMap::zoom_in),
            KeyCode::Char('-') => self.with_map(TerminalMap::zoom_out),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(location) = self.coordinator.map().map(TerminalMap::pick) {
                    self.dispatch(ViewEvent::LocationPicked(location));
                    self.focus = Focus::Form;
                    self.field = FormField::Distance;
                }
            }
            KeyCode::Char('o') => {
                if let Some(map) = self.coordinator.map() {
                    open_in_browser(map.cursor(), map.zoom());
                }
            }
            KeyCode::Char('f') if self.coordinator.form_state() == FormState::Visible => {
                self.focus = Focus::Form;
            }
            _ => return self.on_common_key(key),
        }
        Action::Continue
    }

    fn on_form_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => self.focus = Focus::Map,
            KeyCode::Tab | KeyCode::Down => self.field = self.field.next(),
            KeyCode::BackTab | KeyCode::Up => self.field = self.field.prev(),
            KeyCode::Enter => {
                if let Err(err) = self.coordinator.submit() {
                    tracing::debug!(%err, "submit did not complete");
                }
                // a failed save still creates the workout and closes the form
                if self.coordinator.form_state() == FormState::Hidden {
                    self.selected = 0;
                    self.focus = Focus::Map;
                }
                self.collect_alert();
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if self.field == FormField::Kind => {
                self.coordinator.form_mut().toggle_kind();
            }
            KeyCode::Backspace => {
                if let Some(value) = self.field_value_mut() {
                    value.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(value) = self.field_value_mut() {
                    value.push(c);
                }
            }
            _ => {}
        }
        Action::Continue
    }

    fn on_list_key(&mut self, key: KeyEvent) -> Action {
        let count = self.coordinator.displayed().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    self.dispatch(ViewEvent::ListItemClicked(id));
                    if self.coordinator.map().is_some() {
                        self.focus = Focus::Map;
                    }
                }
            }
            KeyCode::Char('o') => {
                let target = self
                    .coordinator
                    .displayed()
                    .get(self.selected)
                    .map(|w| w.location());
                if let Some(location) = target {
                    open_in_browser(location, self.coordinator.zoom_level());
                }
            }
            _ => return self.on_common_key(key),
        }
        Action::Continue
    }

    /// Keys shared by the map and list panes
    fn on_common_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('R') => return Action::Reset,
            KeyCode::Char('s') => self.dispatch(ViewEvent::SortClicked),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Map => Focus::List,
                    _ => Focus::Map,
                }
            }
            _ => {}
        }
        Action::Continue
    }

    fn dispatch(&mut self, event: ViewEvent) {
        if let Err(err) = self.coordinator.handle(event) {
            tracing::debug!(%err, "event not applied");
        }
        self.collect_alert();
    }

    fn collect_alert(&mut self) {
        if let Some(alert) = self.coordinator.take_alert() {
            self.status = Some(alert);
        }
    }

    fn with_map(&mut self, f: impl FnOnce(&mut TerminalMap)) {
        if let Some(map) = self.coordinator.map_mut() {
            f(map);
        }
    }

    fn selected_id(&self) -> Option<crate::workout::WorkoutId> {
        self.coordinator
            .displayed()
            .get(self.selected)
            .map(|w| w.id().clone())
    }

    fn field_value_mut(&mut self) -> Option<&mut String> {
        let form = self.coordinator.form_mut();
        match self.field {
            FormField::Kind => None,
            FormField::Distance => Some(&mut form.distance),
            FormField::Duration => Some(&mut form.duration),
            FormField::Extra => match form.kind {
                WorkoutKind::Running => Some(&mut form.cadence),
                WorkoutKind::Cycling => Some(&mut form.elevation),
            },
        }
    }
}

fn open_in_browser(location: Location, zoom: u8) {
    if webbrowser::Browser::is_available() {
        if let Err(err) = webbrowser::open(&osm_url(location, zoom)) {
            tracing::warn!(%err, "could not open browser");
        }
    }
}
