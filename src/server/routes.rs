//! Dev Backend Routes
//!
//! - GET /posts - the full post collection
//! - POST /events - publish a feed event to the push channel
//! - GET /health/live, /health/ready, /health - probes

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::error::ServerResult;
use super::state::AppState;
use crate::datastore;
use crate::feed::{FeedEvent, PostsResponse};

/// GET /posts
pub async fn list_posts(State(state): State<Arc<AppState>>) -> Json<PostsResponse> {
    Json(PostsResponse::ok(state.snapshot().await))
}

/// Body of `POST /events`
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub event: String,
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub status: String,
    pub event: String,
    pub subscribers: usize,
}

/// POST /events
///
/// Validates the payload, reduces it into the served list, and broadcasts it.
pub async fn publish_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PublishRequest>,
) -> ServerResult<(StatusCode, Json<PublishResponse>)> {
    let event = FeedEvent::decode(&request.event, request.data)?;
    let subscribers = state.publish(&event).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishResponse {
            status: "published".to_string(),
            event: event.kind().to_string(),
            subscribers,
        }),
    ))
}

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub datastore: String,
    pub posts: usize,
    pub connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// 503 when a datastore was bootstrapped but no longer answers.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match datastore_status(&state).await {
        "error" => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let datastore = datastore_status(&state).await;
    let status = if datastore == "error" { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        datastore: datastore.to_string(),
        posts: state.posts.read().await.len(),
        connections: state.hub.connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn datastore_status(state: &AppState) -> &'static str {
    match &state.datastore {
        None => "disabled",
        Some(client) if datastore::ping(client).await => "ok",
        Some(_) => "error",
    }
}
