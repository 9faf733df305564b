//! Client-side cached movie list

use crate::events::{ChangeEvent, Envelope, EnvelopeError};
use crate::movies::{MovieId, MovieRecord};

/// Ordered mirror of the server's catalog for one client session.
///
/// Every operation is keyed on `id`, which keeps replays idempotent: applying
/// the same prefix of events again leaves the list unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedList {
    movies: Vec<MovieRecord>,
}

impl CachedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(movies: Vec<MovieRecord>) -> Self {
        Self { movies }
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn get(&self, id: &MovieId) -> Option<&MovieRecord> {
        self.movies.iter().find(|m| &m.id == id)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    fn position(&self, id: &MovieId) -> Option<usize> {
        self.movies.iter().position(|m| &m.id == id)
    }

    /// Apply one change. Returns whether the list changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        match event {
            ChangeEvent::Created(record) => {
                if self.position(&record.id).is_some() {
                    return false;
                }
                self.movies.push(record.clone());
                true
            }
            // Upsert: an update for an unknown id stands in for a missed create
            ChangeEvent::Updated(record) => match self.position(&record.id) {
                Some(idx) if self.movies[idx] == *record => false,
                Some(idx) => {
                    self.movies[idx] = record.clone();
                    true
                }
                None => {
                    self.movies.push(record.clone());
                    true
                }
            },
            ChangeEvent::Deleted(r) => match self.position(&r.id) {
                Some(idx) => {
                    self.movies.remove(idx);
                    true
                }
                None => false,
            },
        }
    }

    /// Decode an envelope by its `type` and apply it
    pub fn apply_envelope(&mut self, envelope: Envelope) -> Result<bool, EnvelopeError> {
        let event = envelope.into_event()?;
        Ok(self.apply(&event))
    }
}
