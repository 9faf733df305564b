//! API request handlers

use crate::events::SubscriberRegistry;
use crate::gateway::{MutationError, MutationGateway};
use crate::movies::{MovieDraft, MovieId, MoviePatch, MovieRecord};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Shared server state
pub struct ServerState {
    pub gateway: Arc<MutationGateway>,
    /// Same registry the gateway's broadcaster delivers to
    pub registry: Arc<SubscriberRegistry>,
    /// Interval between server pings on each push connection
    pub ping_interval: Duration,
    /// Outbound envelopes queued per subscriber before it is evicted
    pub subscriber_buffer: usize,
}

/// Shared relay state
pub type RelayState = Arc<ServerState>;

// ============================================================================
// Health check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub subscribers: usize,
}

pub async fn health(State(state): State<RelayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subscribers: state.registry.len(),
    })
}

// ============================================================================
// Movies
// ============================================================================

/// List all movies
pub async fn list_movies(
    State(state): State<RelayState>,
) -> Result<Json<Vec<MovieRecord>>, AppError> {
    let movies = state
        .gateway
        .list()
        .await
        .map_err(|_| AppError::internal("Failed to fetch movies"))?;
    Ok(Json(movies))
}

/// Create a movie and broadcast `movie_created`
pub async fn create_movie(
    State(state): State<RelayState>,
    Json(draft): Json<MovieDraft>,
) -> Result<Json<MovieRecord>, AppError> {
    let created = state
        .gateway
        .handle_create(&draft)
        .await
        .map_err(|e| {
            AppError::from_mutation(e, StatusCode::INTERNAL_SERVER_ERROR, "Failed to create movie")
        })?;
    Ok(Json(created))
}

/// Update a movie and broadcast `movie_updated`
pub async fn update_movie(
    State(state): State<RelayState>,
    Path(id): Path<String>,
    Json(patch): Json<MoviePatch>,
) -> Result<Json<MovieRecord>, AppError> {
    let updated = state
        .gateway
        .handle_update(&MovieId::from(id), &patch)
        .await
        .map_err(|e| {
            AppError::from_mutation(e, StatusCode::NOT_IMPLEMENTED, "Failed to update movie")
        })?;
    Ok(Json(updated))
}

/// Delete a movie and broadcast `movie_deleted`.
///
/// Answers 200 with the deleted record when the store returned one, and 200
/// with an empty body otherwise.
pub async fn delete_movie(
    State(state): State<RelayState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let deleted = state
        .gateway
        .handle_delete(&MovieId::from(id))
        .await
        .map_err(|e| {
            AppError::from_mutation(e, StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete movie")
        })?;

    Ok(match deleted {
        Some(record) => Json(record).into_response(),
        None => StatusCode::OK.into_response(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

/// API error. Upstream details stay in the logs; callers get a generic message.
#[derive(Debug)]
pub enum AppError {
    Upstream { status: StatusCode, message: String },
    BadRequest(String),
}

impl AppError {
    fn internal(message: &str) -> Self {
        AppError::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }

    fn from_mutation(err: MutationError, failure_status: StatusCode, message: &str) -> Self {
        match err {
            MutationError::MissingIdentifier | MutationError::InvalidDraft => {
                AppError::BadRequest(err.to_string())
            }
            MutationError::Upstream(_) => AppError::Upstream {
                status: failure_status,
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Upstream { status, message } => (status, message),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
