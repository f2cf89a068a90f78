use crate::workout::{Workout, WorkoutId};

/// Workouts recorded this session, in creation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStore {
    workouts: Vec<Workout>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    /// Installs `workouts` verbatim, dropping whatever was held before
    pub fn replace_all(&mut self, workouts: Vec<Workout>) {
        self.workouts = workouts;
    }

    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn find_by_id(&self, id: &WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Workout> {
        self.workouts.iter()
    }
}

impl<'a> IntoIterator for &'a SessionStore {
    type Item = &'a Workout;
    type IntoIter = std::slice::Iter<'a, Workout>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
