//! Post Grid Component

use leptos::*;
use postwall::feed::Post;
use std::sync::Arc;

use super::post_card::PostCard;
use crate::state::FeedState;

/// Grid of post cards
#[component]
pub fn PostGrid() -> impl IntoView {
    let state = use_context::<FeedState>().expect("FeedState not found");

    view! {
        {move || {
            if state.posts.with(|posts| posts.is_empty()) {
                view! {
                    <p class="text-gray-400 text-center py-12">"No posts yet."</p>
                }.into_view()
            } else {
                view! {
                    <div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 gap-6">
                        // Keyed by allocation: the reducer only reallocates posts it changed
                        <For
                            each=move || state.posts.get()
                            key=|post| Arc::as_ptr(post) as usize
                            children=move |post: Arc<Post>| view! { <PostCard post=post /> }
                        />
                    </div>
                }.into_view()
            }
        }}
    }
}
