//! # Postwall
//!
//! A live grid of social posts. The wall loads the post list once, then
//! stays current by reducing events from a push channel into it: comment
//! upserts and removals, engagement snapshots, created and removed posts.
//!
//! ## Modules
//!
//! - [`feed`]: Post model, wire protocol, the event reducer, card rendering
//! - [`session`]: Mount-to-unmount lifetime of one wall
//! - [`client`]: Initial load over HTTP
//! - [`live`]: Push channel over a websocket
//! - [`server`]: Dev backend serving posts and the push channel
//! - [`datastore`]: Document store bootstrap
//!
//! Only [`feed`] is built without the `native` feature, so the browser
//! grid can share the reducer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use postwall::{Config, EventKind, FeedSession, PostsClient, WsChannel};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     let source = Arc::new(PostsClient::new(&config.api)?);
//!     let channel = WsChannel::connect(&config.live_url(), &EventKind::ALL).await?;
//!
//!     let session = FeedSession::mount(source, channel);
//!     let mut updates = session.watch();
//!     updates.changed().await?;
//!     println!("{} posts", session.posts().len());
//!
//!     session.unmount().await;
//!     Ok(())
//! }
//! ```

pub mod feed;

#[cfg(feature = "native")]
pub mod client;
#[cfg(feature = "native")]
pub mod config;
#[cfg(feature = "native")]
pub mod datastore;
#[cfg(feature = "native")]
pub mod live;
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod server;
#[cfg(feature = "native")]
pub mod session;

// Re-export top-level types for convenience
pub use feed::{
    apply, decode_server_frame, from_initial, toggle_ai_reply, ClientMessage, Comment,
    CommentVerb, EventError, EventKind, FeedEvent, Inbound, MediaKind, Post, PostCard, PostList,
    PostsResponse, ServerMessage,
};

#[cfg(feature = "native")]
pub use client::{ClientError, PostSource, PostsClient};

#[cfg(feature = "native")]
pub use config::{
    ApiConfig, Config, ConfigError, DatastoreConfig, LiveConfig, LoggingConfig, ServerConfig,
};

#[cfg(feature = "native")]
pub use datastore::DatastoreError;

#[cfg(feature = "native")]
pub use live::{EventChannel, LiveError, WsChannel};

#[cfg(feature = "native")]
pub use server::{build_router, serve, AppState, ServerError};

#[cfg(feature = "native")]
pub use session::{load_initial, Command, FeedSession};
