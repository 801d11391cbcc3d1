//! Feed State
//!
//! Reactive state using Leptos signals. Every write to the post list goes
//! through the shared reducer.

use leptos::*;
use postwall::feed::{self, FeedEvent, Post, PostList};

/// Grid state provided to all components
#[derive(Clone, Copy)]
pub struct FeedState {
    /// Posts in display order
    pub posts: RwSignal<PostList>,
    /// Push channel status
    pub ws_connected: RwSignal<bool>,
    /// True until the initial load settles
    pub loading: RwSignal<bool>,
}

/// Provide feed state to the component tree
pub fn provide_feed_state() -> FeedState {
    let state = FeedState {
        posts: create_rw_signal(PostList::new()),
        ws_connected: create_rw_signal(false),
        loading: create_rw_signal(true),
    };

    provide_context(state);
    state
}

impl FeedState {
    /// Replace the list with a freshly loaded one
    pub fn load(&self, posts: Vec<Post>) {
        self.posts.set(feed::from_initial(posts));
    }

    /// Reduce one push event into the list
    pub fn apply(&self, event: &FeedEvent) {
        self.posts.update(|posts| *posts = feed::apply(posts, event));
    }

    /// Flip a post's local AI-reply flag
    pub fn toggle_ai_reply(&self, post_id: &str) {
        self.posts
            .update(|posts| *posts = feed::toggle_ai_reply(posts, post_id));
    }
}
