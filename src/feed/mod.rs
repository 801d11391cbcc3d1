//! Feed Core
//!
//! Runtime-independent pieces of the post wall. This module builds without
//! the `native` feature so the WASM frontend can share it.
//!
//! - **model**: posts, comments, and the `GET /posts` body
//! - **protocol**: websocket messages and typed feed events
//! - **reconcile**: the `apply(list, event) -> list` reducer
//! - **view**: the per-card render model

pub mod model;
pub mod protocol;
pub mod reconcile;
pub mod view;

pub use model::{Comment, MediaKind, Post, PostList, PostsResponse};
pub use protocol::{
    decode_server_frame, ClientMessage, CommentVerb, EventError, EventKind, FeedEvent, Inbound,
    ServerMessage,
};
pub use reconcile::{apply, from_initial, toggle_ai_reply};
pub use view::PostCard;
