//! Postwall Grid
//!
//! The live post wall in the browser, built with Leptos (WASM).
//!
//! # Architecture
//!
//! Client-side rendered. The post list lives in one signal; the initial
//! `GET /posts` load and the push channel both write to it through the
//! reducer shared with the native crate.

use leptos::*;

mod api;
mod app;
mod components;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
