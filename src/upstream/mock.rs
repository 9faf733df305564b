//! In-memory mock implementation of MovieStore for testing without a real store.

use super::traits::{DeleteOutcome, MovieStore};
use super::UpstreamError;
use crate::movies::{MovieDraft, MovieId, MoviePatch, MovieRecord};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory store assigning ids `m1`, `m2`, ...
///
/// `set_failing(true)` makes every call answer with a 503, which is how tests
/// simulate an unavailable store.
pub struct MockMovieStore {
    records: RwLock<Vec<MovieRecord>>,
    next_id: AtomicU64,
    failing: AtomicBool,
    calls: AtomicU64,
}

impl MockMovieStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            failing: AtomicBool::new(false),
            calls: AtomicU64::new(0),
        }
    }

    /// Create a store already holding the given records
    pub fn with_records(records: Vec<MovieRecord>) -> Self {
        Self {
            next_id: AtomicU64::new(records.len() as u64 + 1),
            records: RwLock::new(records),
            failing: AtomicBool::new(false),
            calls: AtomicU64::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of remote calls received (including failed ones)
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<MovieRecord> {
        self.records.read().await.clone()
    }

    fn check(&self) -> Result<(), UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(UpstreamError::Status {
                status: 503,
                body: "store unavailable".into(),
            });
        }
        Ok(())
    }

    fn year_of(value: &serde_json::Value) -> i32 {
        match value {
            serde_json::Value::Number(n) => n.as_i64().unwrap_or_default() as i32,
            serde_json::Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        }
    }
}

impl Default for MockMovieStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MovieStore for MockMovieStore {
    async fn list(&self) -> Result<Vec<MovieRecord>, UpstreamError> {
        self.check()?;
        Ok(self.records.read().await.clone())
    }

    async fn create(&self, draft: &MovieDraft) -> Result<MovieRecord, UpstreamError> {
        self.check()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = MovieRecord {
            id: MovieId::new(format!("m{}", n)),
            title: draft.title.clone(),
            year: Self::year_of(&draft.year),
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &MovieId,
        patch: &MoviePatch,
    ) -> Result<MovieRecord, UpstreamError> {
        self.check()?;
        let mut records = self.records.write().await;
        let Some(existing) = records.iter_mut().find(|r| &r.id == id) else {
            return Err(UpstreamError::Status {
                status: 404,
                body: "Movie not found".into(),
            });
        };
        if let Some(ref title) = patch.title {
            existing.title = title.clone();
        }
        if let Some(ref year) = patch.year {
            existing.year = Self::year_of(year);
        }
        Ok(existing.clone())
    }

    async fn delete(&self, id: &MovieId) -> Result<DeleteOutcome, UpstreamError> {
        self.check()?;
        let mut records = self.records.write().await;
        match records.iter().position(|r| &r.id == id) {
            Some(idx) => Ok(DeleteOutcome::Deleted(Some(records.remove(idx)))),
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}
