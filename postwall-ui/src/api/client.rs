//! HTTP API Client
//!
//! The one read the grid makes: `GET {base}/posts`.

use gloo_net::http::Request;
use postwall::feed::{Post, PostsResponse};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8082";

const API_URL_KEY: &str = "postwall_api_url";

/// API base URL from local storage, or the default
pub fn get_api_base() -> String {
    let stored = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(API_URL_KEY).ok().flatten());

    stored
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Push channel URL for an API base
pub fn live_url(api_base: &str) -> String {
    let base = api_base
        .trim_end_matches('/')
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1);
    format!("{}/ws", base)
}

/// Fetch the full post collection
pub async fn fetch_posts() -> Result<Vec<Post>, String> {
    let api_base = get_api_base();

    let response = Request::get(&format!("{}/posts", api_base))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(format!("API error: {} {}", response.status(), response.status_text()));
    }

    let body: PostsResponse = response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))?;

    Ok(body.data)
}
