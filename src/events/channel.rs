//! Bounded per-connection channel feeding a WebSocket writer

use super::{ChannelDeliveryFailure, Envelope, EventChannel};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Registry-side half of a WebSocket connection.
///
/// Each connection gets its own bounded queue so a slow client cannot hold
/// up the others. A full queue counts as a failed delivery and gets the
/// subscriber evicted.
pub struct SocketChannel {
    tx: mpsc::Sender<Envelope>,
    capacity: usize,
}

impl SocketChannel {
    /// Create the channel and the receiver the connection task drains
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, capacity }, rx)
    }
}

impl EventChannel for SocketChannel {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, envelope: &Envelope) -> Result<(), ChannelDeliveryFailure> {
        self.tx
            .try_send(envelope.clone())
            .map_err(|e| match e {
                TrySendError::Full(_) => ChannelDeliveryFailure::Backlogged {
                    capacity: self.capacity,
                },
                TrySendError::Closed(_) => ChannelDeliveryFailure::Closed,
            })
    }
}
