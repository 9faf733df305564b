//! Mutation failures

use crate::upstream::UpstreamError;

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// A mutation targeting one record was invoked without an id.
    /// Rejected before any remote call.
    #[error("missing movie identifier")]
    MissingIdentifier,

    /// The draft has no usable title. Rejected before any remote call.
    #[error("movie title must not be empty")]
    InvalidDraft,

    /// The store refused or failed; nothing was broadcast.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
