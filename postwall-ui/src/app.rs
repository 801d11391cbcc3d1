//! App Root Component
//!
//! Owns the mount lifetime: starts the initial load and the push channel,
//! and tears both down on cleanup.

use leptos::*;
use std::cell::Cell;
use std::rc::Rc;

use crate::api;
use crate::components::{Loading, PostGrid};
use crate::state::{provide_feed_state, LiveChannel};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let state = provide_feed_state();
    let api_base = api::get_api_base();

    // Cleared on unmount so a late response is never committed
    let alive = Rc::new(Cell::new(true));

    let alive_for_load = Rc::clone(&alive);
    spawn_local(async move {
        let result = api::fetch_posts().await;
        if !alive_for_load.get() {
            return;
        }
        match result {
            Ok(posts) => state.load(posts),
            Err(e) => web_sys::console::error_1(&format!("Failed to load posts: {}", e).into()),
        }
        state.loading.set(false);
    });

    let channel = match LiveChannel::open(&api::live_url(&api_base), state) {
        Ok(channel) => Some(channel),
        Err(e) => {
            web_sys::console::error_1(&e.into());
            None
        }
    };

    on_cleanup(move || {
        alive.set(false);
        if let Some(channel) = channel {
            channel.close();
        }
    });

    view! {
        <div class="min-h-screen bg-gray-900 text-white">
            <header class="container mx-auto px-4 py-6 flex items-center justify-between">
                <h1 class="text-2xl font-bold">"Posts"</h1>
                <ConnectionStatus />
            </header>

            <main class="container mx-auto px-4 pb-12">
                {move || {
                    if state.loading.get() {
                        view! { <Loading /> }.into_view()
                    } else {
                        view! { <PostGrid /> }.into_view()
                    }
                }}
            </main>
        </div>
    }
}

/// Push channel indicator
#[component]
fn ConnectionStatus() -> impl IntoView {
    let state = use_context::<crate::state::FeedState>().expect("FeedState not found");

    view! {
        <div class="text-sm">
            {move || {
                if state.ws_connected.get() {
                    view! {
                        <span class="flex items-center space-x-1 text-green-400">
                            <span class="w-2 h-2 bg-green-400 rounded-full pulse" />
                            <span>"Live"</span>
                        </span>
                    }.into_view()
                } else {
                    view! {
                        <span class="flex items-center space-x-1 text-gray-400">
                            <span class="w-2 h-2 bg-gray-400 rounded-full" />
                            <span>"Offline"</span>
                        </span>
                    }.into_view()
                }
            }}
        </div>
    }
}
