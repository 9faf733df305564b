//! Mutation gateway
//!
//! Every mutation follows the same shape: validate, forward to the store,
//! and only once the store has accepted it publish exactly one change event.
//! A failed upstream call publishes nothing and is not retried.

use super::MutationError;
use crate::events::{ChangeBroadcaster, ChangeEvent};
use crate::movies::{MovieDraft, MovieId, MoviePatch, MovieRecord, MovieRef};
use crate::upstream::{DeleteOutcome, MovieStore, UpstreamError};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

pub struct MutationGateway {
    store: Arc<dyn MovieStore>,
    broadcaster: Arc<ChangeBroadcaster>,
    /// Present when mutations run one at a time, upstream call and
    /// broadcast included, so publish order equals acceptance order.
    mutation_lock: Option<Mutex<()>>,
}

impl MutationGateway {
    pub fn new(
        store: Arc<dyn MovieStore>,
        broadcaster: Arc<ChangeBroadcaster>,
        serialize_mutations: bool,
    ) -> Self {
        Self {
            store,
            broadcaster,
            mutation_lock: serialize_mutations.then(|| Mutex::new(())),
        }
    }

    pub fn broadcaster(&self) -> &Arc<ChangeBroadcaster> {
        &self.broadcaster
    }

    async fn exclusive(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.mutation_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    fn emit(&self, event: ChangeEvent) {
        self.broadcaster.publish(&event);
    }

    /// Current catalog, straight from the store
    pub async fn list(&self) -> Result<Vec<MovieRecord>, UpstreamError> {
        self.store.list().await.inspect_err(|e| {
            warn!(status = ?e.status(), "Failed to fetch movies: {}", e);
        })
    }

    pub async fn handle_create(&self, draft: &MovieDraft) -> Result<MovieRecord, MutationError> {
        if !draft.has_title() {
            return Err(MutationError::InvalidDraft);
        }

        let _guard = self.exclusive().await;
        let created = self.store.create(draft).await.inspect_err(|e| {
            warn!(status = ?e.status(), "Failed to create movie: {}", e);
        })?;

        info!(movie_id = %created.id, title = %created.title, "Movie created");
        self.emit(ChangeEvent::Created(created.clone()));
        Ok(created)
    }

    pub async fn handle_update(
        &self,
        id: &MovieId,
        patch: &MoviePatch,
    ) -> Result<MovieRecord, MutationError> {
        if id.is_empty() {
            return Err(MutationError::MissingIdentifier);
        }

        let _guard = self.exclusive().await;
        let updated = self.store.update(id, patch).await.inspect_err(|e| {
            warn!(movie_id = %id, status = ?e.status(), "Failed to update movie: {}", e);
        })?;

        info!(movie_id = %updated.id, "Movie updated");
        self.emit(ChangeEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Delete a record.
    ///
    /// "Not found" upstream still yields a deleted event carrying the
    /// requested id: the caller's desired end state (record absent) holds
    /// either way, and clients already missing the record treat it as a no-op.
    pub async fn handle_delete(&self, id: &MovieId) -> Result<Option<MovieRecord>, MutationError> {
        if id.is_empty() {
            return Err(MutationError::MissingIdentifier);
        }

        let _guard = self.exclusive().await;
        let outcome = self.store.delete(id).await.inspect_err(|e| {
            warn!(movie_id = %id, status = ?e.status(), "Failed to delete movie: {}", e);
        })?;

        let (reference, deleted) = match outcome {
            DeleteOutcome::Deleted(Some(record)) => (MovieRef::from(&record), Some(record)),
            DeleteOutcome::Deleted(None) => (MovieRef { id: id.clone() }, None),
            DeleteOutcome::NotFound => {
                info!(movie_id = %id, "Movie already absent upstream, broadcasting delete anyway");
                (MovieRef { id: id.clone() }, None)
            }
        };

        info!(movie_id = %reference.id, "Movie deleted");
        self.emit(ChangeEvent::Deleted(reference));
        Ok(deleted)
    }
}
