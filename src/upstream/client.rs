//! HTTP client for the upstream movie store
//!
//! Talks to `GET/POST {base}/movies` and `PUT/DELETE {base}/movies/{id}`.

use super::traits::{DeleteOutcome, MovieStore};
use super::UpstreamError;
use crate::movies::{MovieDraft, MovieId, MoviePatch, MovieRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the upstream REST store
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    /// Create a client targeting the store root (e.g. "http://localhost:8000")
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create upstream HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/movies", self.base_url)
    }

    fn record_url(&self, id: &MovieId) -> String {
        format!(
            "{}/movies/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }
}

/// Turn a non-2xx response into `UpstreamError::Status`
async fn ensure_success(resp: Response) -> Result<Response, UpstreamError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, UpstreamError> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl MovieStore for UpstreamClient {
    async fn list(&self) -> Result<Vec<MovieRecord>, UpstreamError> {
        let resp = self.client.get(self.collection_url()).send().await?;
        decode(ensure_success(resp).await?).await
    }

    async fn create(&self, draft: &MovieDraft) -> Result<MovieRecord, UpstreamError> {
        let resp = self
            .client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await?;
        decode(ensure_success(resp).await?).await.inspect_err(|e| {
            if let UpstreamError::Decode(_) = e {
                warn!(
                    title = %draft.title,
                    "Store accepted create but its response is not a movie: {}",
                    e
                );
            }
        })
    }

    async fn update(
        &self,
        id: &MovieId,
        patch: &MoviePatch,
    ) -> Result<MovieRecord, UpstreamError> {
        let resp = self
            .client
            .put(self.record_url(id))
            .json(patch)
            .send()
            .await?;
        decode(ensure_success(resp).await?).await.inspect_err(|e| {
            if let UpstreamError::Decode(_) = e {
                warn!(
                    movie_id = %id,
                    "Store accepted update but its response is not a movie: {}",
                    e
                );
            }
        })
    }

    async fn delete(&self, id: &MovieId) -> Result<DeleteOutcome, UpstreamError> {
        let resp = self.client.delete(self.record_url(id)).send().await?;

        // 204 is how the store has historically signalled "nothing to delete"
        if matches!(resp.status(), StatusCode::NOT_FOUND | StatusCode::NO_CONTENT) {
            debug!(movie_id = %id, status = %resp.status(), "Upstream reports movie already absent");
            return Ok(DeleteOutcome::NotFound);
        }

        let bytes = ensure_success(resp).await?.bytes().await?;
        if bytes.is_empty() {
            return Ok(DeleteOutcome::Deleted(None));
        }
        // The store may answer with an acknowledgement instead of the record
        match serde_json::from_slice::<MovieRecord>(&bytes) {
            Ok(record) => Ok(DeleteOutcome::Deleted(Some(record))),
            Err(e) => {
                warn!(movie_id = %id, "Delete acknowledged without a movie record: {}", e);
                Ok(DeleteOutcome::Deleted(None))
            }
        }
    }
}
