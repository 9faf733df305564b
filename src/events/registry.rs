//! Registry of live notification channels

use super::Envelope;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A single subscriber send failed. Logged and never escalated to the mutation caller.
#[derive(Debug, thiserror::Error)]
pub enum ChannelDeliveryFailure {
    #[error("subscriber channel closed")]
    Closed,

    #[error("subscriber backlog full ({capacity} envelopes pending)")]
    Backlogged { capacity: usize },
}

/// Send side of one connected client's notification channel.
pub trait EventChannel: Send + Sync {
    /// Whether the channel can still accept envelopes
    fn is_open(&self) -> bool;

    /// Queue one envelope without waiting for the peer
    fn send(&self, envelope: &Envelope) -> Result<(), ChannelDeliveryFailure>;
}

/// Handle returned by `register`, used for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberHandle(u64);

impl fmt::Display for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub(super) type ChannelMap = BTreeMap<SubscriberHandle, Arc<dyn EventChannel>>;

/// Connection-scoped set of subscribers.
///
/// The membership map is the only shared mutable state of the fan-out path.
/// Channels that close after registering stay until the next broadcast
/// observes them, which removes them.
pub struct SubscriberRegistry {
    channels: RwLock<ChannelMap>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a channel and return its removal handle
    pub fn register(&self, channel: Arc<dyn EventChannel>) -> SubscriberHandle {
        let handle = SubscriberHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.channels.write().insert(handle, channel);
        debug!(subscriber = %handle, "subscriber registered");
        handle
    }

    /// Remove a channel. Returns whether it was still registered.
    pub fn unregister(&self, handle: SubscriberHandle) -> bool {
        let removed = self.channels.write().remove(&handle).is_some();
        if removed {
            debug!(subscriber = %handle, "subscriber unregistered");
        }
        removed
    }

    pub fn contains(&self, handle: SubscriberHandle) -> bool {
        self.channels.read().contains_key(&handle)
    }

    /// Number of registered channels, including ones not yet observed closed
    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }

    /// Handles of every registered channel, oldest first
    pub fn handles(&self) -> Vec<SubscriberHandle> {
        self.channels.read().keys().copied().collect()
    }

    /// Exclusive access for a broadcast pass.
    pub(super) fn lock_for_delivery(&self) -> RwLockWriteGuard<'_, ChannelMap> {
        self.channels.write()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
