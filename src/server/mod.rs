//! Postwall Dev Backend
//!
//! A local stand-in for the real API, built with Axum. It serves the read
//! endpoint from a fixture and the push channel over a websocket, and lets
//! you publish events by hand.
//!
//! # Endpoints
//!
//! - `GET /posts` - `{ success, data: Post[] }`
//! - `GET /ws` - push channel
//! - `POST /events` - publish `{ event, data }` to the push channel
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```bash
//! curl -X POST localhost:8082/events -H 'Content-Type: application/json' \
//!   -d '{"event":"post_removed","data":{"postId":"p2"}}'
//! ```

pub mod error;
pub mod handler;
pub mod hub;
pub mod routes;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use hub::{ConnectionHub, HubConfig, HubError};
pub use state::{load_fixture, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use handler::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::liveness))
        .route("/ready", get(routes::readiness))
        .route("/", get(routes::full_health));

    Router::new()
        .route("/posts", get(routes::list_posts))
        .route("/events", post(routes::publish_event))
        .route("/ws", get(websocket_handler))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        // The browser grid is served from another origin during development
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Start the dev backend and run until a shutdown signal
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<(), ServerError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Postwall dev backend listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Postwall dev backend shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
