//! Application State
//!
//! Shared state accessible by all dev backend handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::error::ServerError;
use super::hub::{ConnectionHub, HubConfig};
use crate::feed::{self, FeedEvent, Post, PostList, PostsResponse, ServerMessage};

/// Shared application state for all handlers
pub struct AppState {
    /// Posts served by `GET /posts`, kept current by published events
    pub posts: RwLock<PostList>,
    /// WebSocket connection hub for the push channel
    pub hub: Arc<ConnectionHub>,
    /// Document store connection, when one was bootstrapped
    pub datastore: Option<mongodb::Client>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state serving `posts`
    pub fn new(posts: Vec<Post>) -> Self {
        Self::with_hub_config(posts, HubConfig::default())
    }

    /// Create state with custom WebSocket hub configuration
    pub fn with_hub_config(posts: Vec<Post>, hub_config: HubConfig) -> Self {
        Self {
            posts: RwLock::new(feed::from_initial(posts)),
            hub: Arc::new(ConnectionHub::new(hub_config)),
            datastore: None,
            start_time: Instant::now(),
        }
    }

    /// Attach a bootstrapped datastore connection
    pub fn with_datastore(mut self, client: mongodb::Client) -> Self {
        self.datastore = Some(client);
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Snapshot of the served posts
    pub async fn snapshot(&self) -> Vec<Post> {
        self.posts
            .read()
            .await
            .iter()
            .map(|post| Post::clone(post))
            .collect()
    }

    /// Reduce `event` into the served list and push it to subscribers.
    ///
    /// Returns the number of connections it was sent to.
    pub async fn publish(&self, event: &FeedEvent) -> Result<usize, ServerError> {
        let message = ServerMessage::event(event)?;

        // Broadcast under the write lock so subscribers see events in the
        // same order they were applied to the served list
        let sent = {
            let mut posts = self.posts.write().await;
            let next = feed::apply(&posts, event);
            *posts = next;
            self.hub.broadcast(event.kind(), &message).await
        };
        tracing::info!(
            kind = %event.kind(),
            post_id = %event.post_id(),
            subscribers = sent,
            "Published event"
        );
        Ok(sent)
    }
}

/// Read a posts fixture: either a bare JSON array or a `{success, data}` body
pub fn load_fixture(path: &Path) -> Result<Vec<Post>, ServerError> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Fixture {
        Wrapped(PostsResponse),
        Bare(Vec<Post>),
    }

    let content = std::fs::read_to_string(path)?;
    let fixture: Fixture = serde_json::from_str(&content)
        .map_err(|e| ServerError::Fixture(format!("{}: {}", path.display(), e)))?;

    Ok(match fixture {
        Fixture::Wrapped(body) => body.data,
        Fixture::Bare(posts) => posts,
    })
}
