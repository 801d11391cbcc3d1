//! Feed Data Model
//!
//! Posts and comments as the backend sends them, plus the local-only
//! AI-reply flag that never leaves the client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Ordered post list in render order. Posts are shared so that a
/// reconciliation step only reallocates the post it touches.
pub type PostList = Vec<Arc<Post>>;

/// A single social-media post with engagement counters and nested comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub media_type: MediaKind,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments_count: u64,
    /// Most recent first
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Local-only UI toggle. Never read from or written to a payload.
    #[serde(skip)]
    pub ai_reply: bool,
}

impl Post {
    /// Create an empty post with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            caption: String::new(),
            media_type: MediaKind::Image,
            media_url: String::new(),
            permalink: String::new(),
            timestamp: String::new(),
            likes: 0,
            comments_count: 0,
            comments: Vec::new(),
            ai_reply: false,
        }
    }

    /// Set the caption
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Set both engagement counters
    pub fn counts(mut self, likes: u64, comments_count: u64) -> Self {
        self.likes = likes;
        self.comments_count = comments_count;
        self
    }

    /// Append a comment (callers pass them most recent first)
    pub fn comment(mut self, comment: Comment) -> Self {
        self.comments.push(comment);
        self
    }

    /// Whether a comment with this id is attached
    pub fn has_comment(&self, comment_id: &str) -> bool {
        self.comments.iter().any(|c| c.id == comment_id)
    }
}

/// A single reply attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub timestamp: String,
    /// Authored by the viewer of this feed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_viewer: Option<bool>,
}

impl Comment {
    pub fn new(id: impl Into<String>, text: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            username: username.into(),
            timestamp: String::new(),
            from_viewer: None,
        }
    }

    pub fn is_from_viewer(&self) -> bool {
        self.from_viewer.unwrap_or(false)
    }
}

/// Media kind of a post. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Album,
    Other(String),
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Image => "IMAGE",
            MediaKind::Video => "VIDEO",
            MediaKind::Album => "CAROUSEL_ALBUM",
            MediaKind::Other(s) => s,
        }
    }
}

impl From<String> for MediaKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IMAGE" => MediaKind::Image,
            "VIDEO" => MediaKind::Video,
            "CAROUSEL_ALBUM" => MediaKind::Album,
            _ => MediaKind::Other(value),
        }
    }
}

impl From<MediaKind> for String {
    fn from(value: MediaKind) -> Self {
        match value {
            MediaKind::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /posts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsResponse {
    /// Present on every response but not acted on
    #[serde(default)]
    pub success: bool,
    pub data: Vec<Post>,
}

impl PostsResponse {
    pub fn ok(data: Vec<Post>) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
