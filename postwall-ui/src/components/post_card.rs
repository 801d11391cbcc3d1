//! Post Card Component
//!
//! One grid cell: media, caption, counts, recent comments and the local
//! AI-reply toggle.

use leptos::*;
use postwall::feed::{MediaKind, Post, PostCard as CardModel};
use std::sync::Arc;

use crate::state::FeedState;

/// Post card component
#[component]
pub fn PostCard(post: Arc<Post>) -> impl IntoView {
    let state = use_context::<FeedState>().expect("FeedState not found");
    let card = CardModel::new(&post);

    let post_id = card.id.to_string();
    let media_url = card.media_url.to_string();
    let media = match card.media_type {
        MediaKind::Video => view! {
            <video src=media_url controls=true class="w-full aspect-square object-cover bg-black" />
        }
        .into_view(),
        _ => view! {
            <img src=media_url alt="" loading="lazy" class="w-full aspect-square object-cover" />
        }
        .into_view(),
    };

    let comments = card
        .recent_comments
        .iter()
        .map(|comment| {
            let class = if comment.is_from_viewer() {
                "text-sm text-primary-300"
            } else {
                "text-sm text-gray-300"
            };
            view! {
                <li class=class>
                    <span class="font-semibold">{comment.username.clone()}</span>
                    " "
                    {comment.text.clone()}
                </li>
            }
        })
        .collect_view();

    let toggle_class = if card.ai_reply {
        "px-3 py-1 rounded-full text-xs bg-green-600 hover:bg-green-500"
    } else {
        "px-3 py-1 rounded-full text-xs bg-gray-600 hover:bg-gray-500"
    };

    view! {
        <article class="bg-gray-800 rounded-lg overflow-hidden border border-gray-700">
            <a href=card.permalink.to_string() target="_blank" rel="noopener">
                {media}
            </a>

            <div class="p-4 space-y-3">
                <p class="text-gray-200 whitespace-pre-line" title=post.caption.clone()>
                    {card.caption.clone()}
                </p>

                <div class="flex items-center justify-between text-sm text-gray-400">
                    <span>{format!("♥ {}", card.likes)}</span>
                    <span>{format!("💬 {}", card.comments_count)}</span>
                    <span>{card.date.clone()}</span>
                </div>

                <ul class="space-y-1">{comments}</ul>

                <button
                    type="button"
                    class=toggle_class
                    on:click=move |_| state.toggle_ai_reply(&post_id)
                >
                    {card.toggle_label()}
                </button>
            </div>
        </article>
    }
}
