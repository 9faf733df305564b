//! HTTP API for the relay

pub mod handlers;
pub mod routes;
pub mod ws_handlers;

pub use handlers::{RelayState, ServerState};
pub use routes::create_router;
