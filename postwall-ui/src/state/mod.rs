//! State Management
//!
//! The post list signal and the push channel that feeds it.

pub mod global;
pub mod websocket;

pub use global::{provide_feed_state, FeedState};
pub use websocket::LiveChannel;
