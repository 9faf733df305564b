//! WebSocket push channel for change envelopes

use super::handlers::RelayState;
use crate::events::{Envelope, SocketChannel, SubscriberHandle, SubscriberRegistry};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

/// WebSocket upgrade handler for `/ws`
///
/// The subscriber is registered before the upgrade response goes out, so a
/// client that sees the handshake complete cannot miss a later publish.
/// Envelopes published in between wait in the channel's queue.
pub async fn ws_events(ws: WebSocketUpgrade, State(state): State<RelayState>) -> impl IntoResponse {
    let (channel, outbound) = SocketChannel::new(state.subscriber_buffer);
    let handle = state.registry.register(Arc::new(channel));

    let registry = state.registry.clone();
    let failed_registry = state.registry.clone();
    let ping_every = state.ping_interval;

    ws.on_failed_upgrade(move |e| {
        warn!(subscriber = %handle, "WebSocket upgrade failed: {}", e);
        failed_registry.unregister(handle);
    })
    .on_upgrade(move |socket| handle_ws(socket, outbound, registry, handle, ping_every))
}

/// Pump queued envelopes to one client until either side goes away
async fn handle_ws(
    socket: WebSocket,
    mut outbound: mpsc::Receiver<Envelope>,
    registry: Arc<SubscriberRegistry>,
    handle: SubscriberHandle,
    ping_every: Duration,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut ping_interval = interval(ping_every);
    // Skip the first immediate tick
    ping_interval.tick().await;

    debug!(subscriber = %handle, "WebSocket client connected");

    loop {
        tokio::select! {
            envelope = outbound.recv() => {
                // Sender dropped: the broadcaster evicted this subscriber
                let Some(envelope) = envelope else {
                    debug!(subscriber = %handle, "Subscriber evicted, closing socket");
                    break;
                };
                match envelope.to_json() {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            debug!(subscriber = %handle, "WebSocket send failed, client disconnected");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to serialize envelope: {}", e);
                    }
                }
            }

            // Send periodic pings to detect dead clients
            _ = ping_interval.tick() => {
                if ws_sender.send(Message::Ping(vec![].into())).await.is_err() {
                    debug!(subscriber = %handle, "Ping failed, client disconnected");
                    break;
                }
            }

            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(subscriber = %handle, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(subscriber = %handle, "WebSocket error: {}", e);
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        debug!(subscriber = %handle, message = %text.as_str(), "Ignoring client message");
                    }
                    _ => {
                        // Pong / binary
                    }
                }
            }
        }
    }

    registry.unregister(handle);
    let _ = ws_sender.close().await;
    debug!(subscriber = %handle, "WebSocket connection closed");
}
