//! Trait abstraction for the upstream movie store

use super::UpstreamError;
use crate::movies::{MovieDraft, MovieId, MoviePatch, MovieRecord};
use async_trait::async_trait;

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The store removed the record. It may or may not echo it back.
    Deleted(Option<MovieRecord>),
    /// The store reports the record is already absent.
    NotFound,
}

/// Remote CRUD operations on movie records.
///
/// Each call is one remote request with no retry and no state of its own.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Fetch every record
    async fn list(&self) -> Result<Vec<MovieRecord>, UpstreamError>;

    /// Create a record from a draft; the store assigns the id
    async fn create(&self, draft: &MovieDraft) -> Result<MovieRecord, UpstreamError>;

    /// Apply a patch to an existing record
    async fn update(&self, id: &MovieId, patch: &MoviePatch)
        -> Result<MovieRecord, UpstreamError>;

    /// Remove a record
    async fn delete(&self, id: &MovieId) -> Result<DeleteOutcome, UpstreamError>;
}
