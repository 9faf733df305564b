//! Change broadcaster: one envelope to every open subscriber

use super::{ChangeEvent, Envelope, SubscriberRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a single `publish` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the envelope was queued for
    pub delivered: usize,
    /// Subscribers found closed and removed without a send attempt
    pub skipped: usize,
    /// Subscribers whose send failed; removed as well
    pub failed: usize,
}

/// Delivers change events to the members of a `SubscriberRegistry`.
///
/// A publish pass holds the registry exclusively, so envelopes reach each
/// subscriber in the order `publish` was called. Sends never wait on a peer.
#[derive(Clone)]
pub struct ChangeBroadcaster {
    registry: Arc<SubscriberRegistry>,
}

impl ChangeBroadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Serialize `event` into an envelope and fan it out.
    ///
    /// A failing subscriber is removed and does not affect the others.
    pub fn publish(&self, event: &ChangeEvent) -> PublishReport {
        let envelope = match Envelope::from_event(event) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(movie_id = %event.movie_id(), "Failed to encode change event: {}", e);
                return PublishReport::default();
            }
        };

        let mut report = PublishReport::default();
        let mut channels = self.registry.lock_for_delivery();
        channels.retain(|handle, channel| {
            if !channel.is_open() {
                debug!(subscriber = %handle, "Dropping closed subscriber");
                report.skipped += 1;
                return false;
            }
            match channel.send(&envelope) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(e) => {
                    warn!(subscriber = %handle, error = %e, "Delivery failed, removing subscriber");
                    report.failed += 1;
                    false
                }
            }
        });
        let remaining = channels.len();
        drop(channels);

        debug!(
            event_type = ?envelope.event_type,
            movie_id = %event.movie_id(),
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            subscribers = remaining,
            "Change event published"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EnvelopeType, EventChannel};
    use crate::movies::{MovieId, MovieRef};
    use crate::test_helpers::{movie, FailingChannel, RecordingChannel};

    fn setup() -> (Arc<SubscriberRegistry>, ChangeBroadcaster) {
        let registry = Arc::new(SubscriberRegistry::new());
        let broadcaster = ChangeBroadcaster::new(registry.clone());
        (registry, broadcaster)
    }

    #[test]
    fn test_publish_without_subscribers() {
        let (_, broadcaster) = setup();
        let report = broadcaster.publish(&ChangeEvent::Created(movie("m1", "Dune", 1984)));
        assert_eq!(report, PublishReport::default());
    }

    #[test]
    fn test_every_open_subscriber_receives() {
        let (registry, broadcaster) = setup();
        let channels: Vec<_> = (0..3).map(|_| Arc::new(RecordingChannel::new())).collect();
        for c in &channels {
            registry.register(c.clone());
        }

        let report = broadcaster.publish(&ChangeEvent::Created(movie("m1", "Dune", 1984)));
        assert_eq!(report.delivered, 3);

        for c in &channels {
            let received = c.envelopes();
            assert_eq!(received.len(), 1);
            assert_eq!(received[0].event_type, EnvelopeType::MovieCreated);
            assert_eq!(received[0].data["id"], "m1");
        }
    }

    #[test]
    fn test_failing_subscriber_is_isolated_and_removed() {
        let (registry, broadcaster) = setup();
        let good_a = Arc::new(RecordingChannel::new());
        let good_b = Arc::new(RecordingChannel::new());
        registry.register(good_a.clone());
        let bad = registry.register(Arc::new(FailingChannel));
        registry.register(good_b.clone());

        let report = broadcaster.publish(&ChangeEvent::Updated(movie("m1", "Dune", 2021)));
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert!(!registry.contains(bad));
        assert_eq!(good_a.envelopes().len(), 1);
        assert_eq!(good_b.envelopes().len(), 1);

        // Removed subscriber is not retried on the next publish
        let report = broadcaster.publish(&ChangeEvent::Updated(movie("m1", "Dune", 2021)));
        assert_eq!(report.failed, 0);
        assert_eq!(report.delivered, 2);
    }

    #[test]
    fn test_closed_subscriber_skipped_and_removed() {
        let (registry, broadcaster) = setup();
        let open = Arc::new(RecordingChannel::new());
        let closed = Arc::new(RecordingChannel::new());
        registry.register(open.clone());
        let handle = registry.register(closed.clone());
        closed.close();
        assert!(!closed.is_open());

        let report = broadcaster.publish(&ChangeEvent::Deleted(MovieRef {
            id: MovieId::from("m1"),
        }));
        assert_eq!(report.skipped, 1);
        assert_eq!(report.delivered, 1);
        assert!(!registry.contains(handle));
        assert!(closed.envelopes().is_empty());
    }

    #[test]
    fn test_per_subscriber_order_matches_publish_order() {
        let (registry, broadcaster) = setup();
        let channel = Arc::new(RecordingChannel::new());
        registry.register(channel.clone());

        let events = vec![
            ChangeEvent::Created(movie("m1", "Dune", 1984)),
            ChangeEvent::Updated(movie("m1", "Dune", 2021)),
            ChangeEvent::Created(movie("m2", "Alien", 1979)),
            ChangeEvent::Deleted(MovieRef {
                id: MovieId::from("m1"),
            }),
        ];
        for e in &events {
            broadcaster.publish(e);
        }

        let decoded: Vec<ChangeEvent> = channel
            .envelopes()
            .into_iter()
            .map(|e| e.into_event().unwrap())
            .collect();
        assert_eq!(decoded, events);
    }

    #[tokio::test]
    async fn test_concurrent_publishers_keep_single_subscriber_order_consistent() {
        let (registry, broadcaster) = setup();
        let a = Arc::new(RecordingChannel::new());
        let b = Arc::new(RecordingChannel::new());
        registry.register(a.clone());
        registry.register(b.clone());

        let mut tasks = Vec::new();
        for n in 0..8 {
            let broadcaster = broadcaster.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..25 {
                    let id = format!("m{}-{}", n, i);
                    broadcaster.publish(&ChangeEvent::Created(movie(&id, "x", 2000)));
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        // Both subscribers observed the same total order
        assert_eq!(a.envelopes().len(), 200);
        assert_eq!(a.envelopes(), b.envelopes());
    }
}
