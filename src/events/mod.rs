//! Change notification fan-out
//!
//! This module provides:
//! - `ChangeEvent`: typed change emitted after every accepted mutation
//! - `Envelope`: the `{type, data}` wire form pushed to clients
//! - `SubscriberRegistry`: the set of live notification channels
//! - `ChangeBroadcaster`: delivers one envelope to every open subscriber

mod broadcaster;
mod channel;
mod registry;
mod types;

pub use broadcaster::{ChangeBroadcaster, PublishReport};
pub use channel::SocketChannel;
pub use registry::{ChannelDeliveryFailure, EventChannel, SubscriberHandle, SubscriberRegistry};
pub use types::{ChangeEvent, ChangeKind, Envelope, EnvelopeError, EnvelopeType};
