//! Consumer side of the push protocol
//!
//! - `CachedList`: applies change events to a local copy of the catalog
//! - `ClientSession`: buffers events until the initial fetch has landed
//! - `MovieFeed`: a live session over HTTP + WebSocket against a relay

mod cache;
mod feed;
mod session;

pub use cache::CachedList;
pub use feed::{websocket_url, MovieFeed};
pub use session::{ClientSession, SyncState};
