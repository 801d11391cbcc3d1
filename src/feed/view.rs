//! Post Card Render Model
//!
//! Everything a renderer needs to draw one grid cell, shared by the
//! terminal watcher and the browser grid.

use chrono::DateTime;

use super::model::{Comment, MediaKind, Post};

/// Caption lines shown before truncation
pub const CAPTION_LINES: usize = 2;

/// Comments shown per card
pub const RECENT_COMMENTS: usize = 5;

/// Display-ready view of a post
#[derive(Debug, Clone, PartialEq)]
pub struct PostCard<'a> {
    pub id: &'a str,
    pub media_url: &'a str,
    pub media_type: &'a MediaKind,
    pub permalink: &'a str,
    pub caption: String,
    pub caption_truncated: bool,
    pub likes: u64,
    pub comments_count: u64,
    pub date: String,
    pub recent_comments: &'a [Comment],
    pub ai_reply: bool,
}

impl<'a> PostCard<'a> {
    pub fn new(post: &'a Post) -> Self {
        let (caption, caption_truncated) = truncate_lines(&post.caption, CAPTION_LINES);
        let shown = post.comments.len().min(RECENT_COMMENTS);

        Self {
            id: &post.id,
            media_url: &post.media_url,
            media_type: &post.media_type,
            permalink: &post.permalink,
            caption,
            caption_truncated,
            likes: post.likes,
            comments_count: post.comments_count,
            date: format_date(&post.timestamp),
            recent_comments: &post.comments[..shown],
            ai_reply: post.ai_reply,
        }
    }

    /// Label for the toggle button
    pub fn toggle_label(&self) -> &'static str {
        if self.ai_reply {
            "AI reply: on"
        } else {
            "AI reply: off"
        }
    }
}

/// Keep the first `max_lines` lines. Returns whether anything was cut.
pub fn truncate_lines(text: &str, max_lines: usize) -> (String, bool) {
    let mut lines = text.lines();
    let kept: Vec<&str> = lines.by_ref().take(max_lines).collect();
    let truncated = lines.next().is_some();

    let mut out = kept.join("\n");
    if truncated {
        out.push('…');
    }
    (out, truncated)
}

/// Format a timestamp as `Jan 02, 2024`. Accepts RFC 3339 and the
/// colon-less `+0000` offset form. Unparseable input is returned as-is.
pub fn format_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .or_else(|_| DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.format("%b %d, %Y").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_truncated_to_two_lines() {
        let post = Post::new("p1").caption("one\ntwo\nthree");
        let card = PostCard::new(&post);
        assert_eq!(card.caption, "one\ntwo…");
        assert!(card.caption_truncated);

        let post = Post::new("p2").caption("short");
        let card = PostCard::new(&post);
        assert_eq!(card.caption, "short");
        assert!(!card.caption_truncated);
    }

    #[test]
    fn test_at_most_five_recent_comments() {
        let mut post = Post::new("p1");
        for i in 0..8 {
            post = post.comment(Comment::new(format!("c{i}"), "t", "u"));
        }
        let card = PostCard::new(&post);
        assert_eq!(card.recent_comments.len(), RECENT_COMMENTS);
        assert_eq!(card.recent_comments[0].id, "c0");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05T10:00:00+00:00"), "Mar 05, 2024");
        assert_eq!(format_date("2024-03-05T10:00:00+0000"), "Mar 05, 2024");
        assert_eq!(format_date("2023-12-31T23:30:00-0500"), "Dec 31, 2023");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_toggle_label_follows_flag() {
        let mut post = Post::new("p1");
        assert_eq!(PostCard::new(&post).toggle_label(), "AI reply: off");
        post.ai_reply = true;
        assert_eq!(PostCard::new(&post).toggle_label(), "AI reply: on");
    }
}
