//! Postwall Dev Backend
//!
//! Run with: cargo run --bin postwall-dev
//!
//! # Configuration
//!
//! Environment variables:
//! - `POSTWALL_HOST`: Host to bind to (default: 0.0.0.0)
//! - `POSTWALL_PORT`: Port to listen on (default: 8082)
//! - `POSTWALL_FIXTURE`: JSON file with the posts to serve (default: none)
//! - `MONGODB_URI`: Datastore connection string (optional; the process
//!   exits if it is set but the datastore is unreachable)
//! - `RUST_LOG`: Log filter (default: derived from `POSTWALL_LOG_LEVEL`)

use postwall::config::Config;
use postwall::server::{load_fixture, serve, AppState};
use postwall::{datastore, logging};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    logging::init(&config.logging);

    tracing::info!("Starting Postwall dev backend v{}", env!("CARGO_PKG_VERSION"));

    let posts = match &config.server.fixture {
        Some(path) => {
            let posts = load_fixture(Path::new(path))?;
            tracing::info!("Loaded {} posts from {}", posts.len(), path);
            posts
        }
        None => {
            tracing::info!("No fixture configured (set POSTWALL_FIXTURE); serving an empty wall");
            Vec::new()
        }
    };

    let mut state = AppState::new(posts);

    if config.datastore.uri().is_some() {
        let client = datastore::bootstrap(&config.datastore).await;
        state = state.with_datastore(client);
    } else {
        tracing::info!(
            "Datastore disabled (set {} to enable)",
            config.datastore.uri_env
        );
    }

    serve(state, &config.server).await?;

    tracing::info!("Postwall dev backend stopped");
    Ok(())
}
