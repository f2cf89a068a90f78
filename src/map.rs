use crate::workout::{Location, WorkoutKind};

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;

/// A pin placed on the map for one workout
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub location: Location,
    pub popup: String,
    pub style_class: &'static str,
}

impl Marker {
    pub fn kind(&self) -> WorkoutKind {
        if self.style_class == WorkoutKind::Cycling.popup_class() {
            WorkoutKind::Cycling
        } else {
            WorkoutKind::Running
        }
    }
}

/// Map collaborator. A map only exists once it has been initialized around a center.
pub trait MapView {
    fn initialize(center: Location, zoom: u8) -> Self
    where
        Self: Sized;
    fn add_marker(&mut self, location: Location, popup: &str, style_class: &'static str);
    fn pan_to(&mut self, location: Location, zoom: u8, animate: bool);
}

/// Map state rendered by the terminal canvas
#[derive(Debug, Clone)]
pub struct TerminalMap {
    center: Location,
    zoom: u8,
    cursor: Location,
    markers: Vec<Marker>,
}

impl MapView for TerminalMap {
    fn initialize(center: Location, zoom: u8) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            cursor: center,
            markers: Vec::new(),
        }
    }

    fn add_marker(&mut self, location: Location, popup: &str, style_class: &'static str) {
        self.markers.push(Marker {
            location,
            popup: popup.to_string(),
            style_class,
        });
    }

    fn pan_to(&mut self, location: Location, zoom: u8, _animate: bool) {
        // the terminal redraws in one frame, nothing to animate
        self.center = location;
        self.cursor = location;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

impl TerminalMap {
    pub fn center(&self) -> Location {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn cursor(&self) -> Location {
        self.cursor
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Half the visible longitude span in degrees
    pub fn half_span(&self) -> f64 {
        // roughly eight map tiles across a terminal pane
        180.0 * 8.0 / 2f64.powi(self.zoom as i32)
    }

    /// (west, east) and (south, north) bounds of the visible area
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let half = self.half_span();
        // terminal cells are about twice as tall as wide
        let half_lat = half / 2.0;
        (
            [self.center.lng - half, self.center.lng + half],
            [self.center.lat - half_lat, self.center.lat + half_lat],
        )
    }

    /// Moves the pick cursor by a number of steps, re-centering when it leaves the view
    pub fn move_cursor(&mut self, d_lat: i32, d_lng: i32) {
        let step = self.half_span() / 20.0;
        let lat = (self.cursor.lat + d_lat as f64 * step).clamp(-85.0, 85.0);
        let mut lng = self.cursor.lng + d_lng as f64 * step;
        if lng > 180.0 {
            lng -= 360.0;
        } else if lng < -180.0 {
            lng += 360.0;
        }
        self.cursor = Location::new(lat, lng);

        let ([west, east], [south, north]) = self.bounds();
        if lng < west || lng > east || lat < south || lat > north {
            self.center = self.cursor;
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
        self.center = self.cursor;
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// The location under the cursor, as delivered to location-pick handlers
    pub fn pick(&self) -> Location {
        self.cursor
    }
}

/// OpenStreetMap link for a location at a given zoom
pub fn osm_url(location: Location, zoom: u8) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat:.5}&mlon={lng:.5}#map={zoom}/{lat:.5}/{lng:.5}",
        lat = location.lat,
        lng = location.lng,
        zoom = zoom
    )
}
