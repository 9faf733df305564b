//! Upstream store failures

/// The remote store failed or answered with an error status.
///
/// Never retried; surfaced to HTTP callers as a generic 5xx.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid upstream response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl UpstreamError {
    /// Remote HTTP status, when the store answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            UpstreamError::Transport(e) => e.status().map(|s| s.as_u16()),
            UpstreamError::Decode(_) => None,
        }
    }
}
