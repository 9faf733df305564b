//! Client sync state: snapshot first, then incremental events

use super::CachedList;
use crate::events::ChangeEvent;
use crate::movies::MovieRecord;
use tracing::debug;

/// Where a session stands relative to its initial fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Subscribed but the bulk fetch has not completed; events wait here.
    AwaitingSnapshot { buffered: Vec<ChangeEvent> },
    /// Snapshot installed; events apply directly.
    Live(CachedList),
}

/// One client's view of the catalog.
///
/// The channel is opened before the bulk fetch, so events may arrive while
/// the fetch is still in flight. They are held back and replayed over the
/// snapshot in arrival order; the reducer is idempotent, so an event already
/// reflected in the snapshot is harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    state: SyncState,
}

impl ClientSession {
    pub fn new() -> Self {
        Self {
            state: SyncState::AwaitingSnapshot {
                buffered: Vec::new(),
            },
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, SyncState::Live(_))
    }

    pub fn buffered_len(&self) -> usize {
        match &self.state {
            SyncState::AwaitingSnapshot { buffered } => buffered.len(),
            SyncState::Live(_) => 0,
        }
    }

    /// The cached list, once live
    pub fn cache(&self) -> Option<&CachedList> {
        match &self.state {
            SyncState::Live(cache) => Some(cache),
            SyncState::AwaitingSnapshot { .. } => None,
        }
    }

    /// Movies as currently known; empty until the snapshot lands
    pub fn movies(&self) -> &[MovieRecord] {
        self.cache().map(CachedList::movies).unwrap_or(&[])
    }

    /// Feed one inbound event. Returns whether the visible list changed.
    pub fn on_event(&mut self, event: ChangeEvent) -> bool {
        match &mut self.state {
            SyncState::AwaitingSnapshot { buffered } => {
                buffered.push(event);
                false
            }
            SyncState::Live(cache) => cache.apply(&event),
        }
    }

    /// Install a full fetch result and replay anything buffered meanwhile.
    ///
    /// On a live session this replaces the cache outright (explicit refetch).
    pub fn on_snapshot(&mut self, movies: Vec<MovieRecord>) {
        let mut cache = CachedList::from_snapshot(movies);
        let previous = std::mem::replace(&mut self.state, SyncState::Live(CachedList::new()));
        if let SyncState::AwaitingSnapshot { buffered } = previous {
            debug!(buffered = buffered.len(), "Replaying events received during fetch");
            for event in &buffered {
                cache.apply(event);
            }
        }
        self.state = SyncState::Live(cache);
    }

    /// Go back to buffering ahead of a refetch
    pub fn resync(&mut self) {
        self.state = SyncState::AwaitingSnapshot {
            buffered: Vec::new(),
        };
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}
