//! Live-State Reconciliation
//!
//! Pure transformations over a [`PostList`]. Each function takes the current
//! list and returns a new one; posts that are not targeted keep their `Arc`,
//! so a renderer can skip them by pointer comparison.
//!
//! Counter precedence: engagement snapshots overwrite `likes` and
//! `comments_count` outright. Comment events nudge `comments_count` by one
//! between snapshots. Whichever arrives last in delivery order wins.

use std::sync::Arc;

use super::model::{Post, PostList};
use super::protocol::{CommentVerb, FeedEvent};

/// Build the list from an initial load. Every post starts with the
/// local flag cleared.
pub fn from_initial(posts: Vec<Post>) -> PostList {
    posts
        .into_iter()
        .map(|mut post| {
            post.ai_reply = false;
            Arc::new(post)
        })
        .collect()
}

/// Apply one feed event
pub fn apply(posts: &[Arc<Post>], event: &FeedEvent) -> PostList {
    match event {
        FeedEvent::Comment {
            post_id,
            verb,
            comment,
        } => update_post(posts, post_id, |post| match verb {
            CommentVerb::Remove => {
                post.comments.retain(|c| c.id != comment.id);
                post.comments_count = post.comments_count.saturating_sub(1);
                true
            }
            CommentVerb::Upsert(_) => {
                if post.has_comment(&comment.id) {
                    return false;
                }
                post.comments.insert(0, comment.clone());
                post.comments_count += 1;
                true
            }
        }),
        FeedEvent::Engagement {
            post_id,
            likes,
            comments_count,
        } => update_post(posts, post_id, |post| {
            post.likes = *likes;
            post.comments_count = *comments_count;
            true
        }),
        FeedEvent::PostCreated { post } => {
            if posts.iter().any(|p| p.id == post.id) {
                tracing::trace!(post_id = %post.id, "Post already listed, ignoring create");
                return posts.to_vec();
            }
            let mut fresh = post.clone();
            fresh.ai_reply = false;

            let mut next = Vec::with_capacity(posts.len() + 1);
            next.push(Arc::new(fresh));
            next.extend(posts.iter().cloned());
            next
        }
        FeedEvent::PostRemoved { post_id } => {
            posts.iter().filter(|p| &p.id != post_id).cloned().collect()
        }
    }
}

/// Flip the local-only AI-reply flag of one post
pub fn toggle_ai_reply(posts: &[Arc<Post>], post_id: &str) -> PostList {
    update_post(posts, post_id, |post| {
        post.ai_reply = !post.ai_reply;
        true
    })
}

/// Rebuild the list with `edit` applied to the post with `post_id`.
///
/// `edit` works on a copy and returns whether it changed anything; if it
/// did not, the original `Arc` is kept.
fn update_post<F>(posts: &[Arc<Post>], post_id: &str, edit: F) -> PostList
where
    F: FnOnce(&mut Post) -> bool,
{
    let Some(index) = posts.iter().position(|p| p.id == post_id) else {
        tracing::trace!(post_id = %post_id, "Post not in list, ignoring");
        return posts.to_vec();
    };

    let mut next = posts.to_vec();
    let mut post = Post::clone(&next[index]);
    if edit(&mut post) {
        next[index] = Arc::new(post);
    }
    next
}
