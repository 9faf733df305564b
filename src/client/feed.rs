//! Live catalog feed from a running relay

use super::ClientSession;
use crate::events::{ChangeEvent, Envelope};
use crate::movies::MovieRecord;
use anyhow::{bail, Context, Result};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, warn};

/// Derive the push endpoint from the relay's HTTP base URL
pub fn websocket_url(base_url: &str) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else {
        bail!("Relay URL must start with http:// or https://: {}", base_url);
    };
    Ok(format!("{}/ws", ws))
}

/// A client session bound to a relay.
///
/// `connect` subscribes first and fetches second, so nothing published in
/// between is lost. After the relay closes the push channel (for example
/// because this client fell behind and was evicted), `reconnect` repeats the
/// same sequence on top of a fresh buffer.
pub struct MovieFeed {
    base_url: String,
    http: reqwest::Client,
    session: ClientSession,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    reader: JoinHandle<()>,
}

impl MovieFeed {
    /// Open the push channel, fetch the catalog, and return a live feed
    pub async fn connect(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();
        let mut session = ClientSession::new();
        let (events, reader) = subscribe_and_fetch(&http, &base_url, &mut session).await?;

        Ok(Self {
            base_url,
            http,
            session,
            events,
            reader,
        })
    }

    /// Drop the current push channel, resubscribe, and refetch the catalog.
    ///
    /// On error the session stays in the buffering state and the call can be
    /// retried.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.reader.abort();
        self.session.resync();
        let (events, reader) =
            subscribe_and_fetch(&self.http, &self.base_url, &mut self.session).await?;
        self.events = events;
        self.reader = reader;
        debug!(url = %self.base_url, movies = self.session.movies().len(), "Feed resynchronized");
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn movies(&self) -> &[MovieRecord] {
        self.session.movies()
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    /// Wait for the next change, apply it, and return it.
    ///
    /// `None` once the relay closed the channel; call `reconnect` to resume.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        let event = self.events.recv().await?;
        self.session.on_event(event.clone());
        Some(event)
    }
}

impl Drop for MovieFeed {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Open the push channel, then fetch the list while buffering into `session`.
///
/// Leaves `session` live on success.
async fn subscribe_and_fetch(
    http: &reqwest::Client,
    base: &str,
    session: &mut ClientSession,
) -> Result<(mpsc::UnboundedReceiver<ChangeEvent>, JoinHandle<()>)> {
    let ws_url = websocket_url(base)?;

    let (stream, _) = tokio_tungstenite::connect_async(ws_url.as_str())
        .await
        .with_context(|| format!("Failed to open push channel at {}", ws_url))?;
    debug!(url = %ws_url, "Push channel open");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(read_envelopes(stream, tx));

    let fetch = fetch_movies(http, base);
    tokio::pin!(fetch);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                session.on_event(event);
            }
            result = &mut fetch => {
                match result {
                    Ok(movies) => {
                        session.on_snapshot(movies);
                        return Ok((rx, reader));
                    }
                    Err(e) => {
                        reader.abort();
                        return Err(e);
                    }
                }
            }
        }
    }
}

async fn fetch_movies(http: &reqwest::Client, base: &str) -> Result<Vec<MovieRecord>> {
    let url = format!("{}/api/movies", base);
    let movies = http
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?
        .error_for_status()
        .context("Relay refused movie list")?
        .json::<Vec<MovieRecord>>()
        .await
        .context("Invalid movie list")?;
    Ok(movies)
}

/// Decode inbound envelopes until the channel closes or the feed is dropped
async fn read_envelopes<S>(mut stream: S, tx: mpsc::UnboundedSender<ChangeEvent>)
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                match Envelope::from_json(text.as_str()).and_then(Envelope::into_event) {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring undecodable envelope: {}", e),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("Relay closed the push channel");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Push channel error: {}", e);
                break;
            }
        }
    }
}
