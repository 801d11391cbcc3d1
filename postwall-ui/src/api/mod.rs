//! Backend access for the grid

pub mod client;

pub use client::{fetch_posts, get_api_base, live_url};
