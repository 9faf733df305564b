//! Test helper factories and fake notification channels
#![allow(dead_code)]

use crate::events::{
    ChangeBroadcaster, ChannelDeliveryFailure, Envelope, EventChannel, SubscriberRegistry,
};
use crate::gateway::MutationGateway;
use crate::movies::{MovieId, MovieRecord};
use crate::upstream::mock::MockMovieStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// Test data factories
// ============================================================================

/// Create a movie record with the given id
pub fn movie(id: &str, title: &str, year: i32) -> MovieRecord {
    MovieRecord {
        id: MovieId::from(id),
        title: title.to_string(),
        year,
    }
}

// ============================================================================
// Fake channels
// ============================================================================

/// Channel that keeps every envelope it is sent and can be closed on demand.
pub struct RecordingChannel {
    received: Mutex<Vec<Envelope>>,
    open: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
        }
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.received.lock().clone()
    }
}

impl EventChannel for RecordingChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, envelope: &Envelope) -> Result<(), ChannelDeliveryFailure> {
        self.received.lock().push(envelope.clone());
        Ok(())
    }
}

/// Channel that reports open but whose peer is already gone on send
pub struct FailingChannel;

impl EventChannel for FailingChannel {
    fn is_open(&self) -> bool {
        true
    }

    fn send(&self, _envelope: &Envelope) -> Result<(), ChannelDeliveryFailure> {
        Err(ChannelDeliveryFailure::Closed)
    }
}

// ============================================================================
// Mock state builders
// ============================================================================

/// Gateway wired to an in-memory store and a fresh registry
pub fn mock_gateway(store: Arc<MockMovieStore>) -> (MutationGateway, Arc<SubscriberRegistry>) {
    let registry = Arc::new(SubscriberRegistry::new());
    let broadcaster = Arc::new(ChangeBroadcaster::new(registry.clone()));
    (MutationGateway::new(store, broadcaster, true), registry)
}
