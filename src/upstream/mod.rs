//! Upstream movie store: contract, HTTP client and in-memory mock

pub mod client;
mod error;
pub mod traits;

pub use client::UpstreamClient;
pub use error::UpstreamError;
pub use traits::{DeleteOutcome, MovieStore};

#[cfg(test)]
pub(crate) mod mock;
