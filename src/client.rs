//! Posts REST Client
//!
//! HTTP client for the backend read endpoint, and the [`PostSource`] seam the
//! feed session loads through.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::feed::{Post, PostsResponse};

/// Anything that can produce the full post collection
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<Post>, ClientError>;
}

/// Client for `GET {base}/posts`
pub struct PostsClient {
    client: Client,
    base_url: String,
}

impl PostsClient {
    /// Create a new client with the given configuration.
    ///
    /// No request timeout is set: the load waits as long as the backend does.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }
}

#[async_trait]
impl PostSource for PostsClient {
    async fn fetch_posts(&self) -> Result<Vec<Post>, ClientError> {
        let url = self.posts_url();
        tracing::debug!(url = %url, "Fetching posts");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                ClientError::Unavailable
            } else {
                ClientError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: PostsResponse = response.json().await.map_err(ClientError::Request)?;
        tracing::debug!(count = body.data.len(), "Fetched posts");
        Ok(body.data)
    }
}

/// Errors that can occur when loading posts
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
}
