//! Push Channel
//!
//! Browser websocket to the backend. Every frame is decoded and validated
//! before it reaches the reducer. No reconnect: a dropped channel just
//! stops updating the grid.

use leptos::*;
use postwall::feed::{decode_server_frame, ClientMessage, EventKind, Inbound, ServerMessage};
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::global::FeedState;

struct Handlers {
    _on_open: Closure<dyn FnMut(JsValue)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

/// One subscription to the push channel, owned by the mounted grid
pub struct LiveChannel {
    ws: WebSocket,
    handlers: RefCell<Option<Handlers>>,
    closed: Cell<bool>,
}

impl LiveChannel {
    /// Open the socket and subscribe to every event kind once it is up
    pub fn open(url: &str, state: FeedState) -> Result<Self, String> {
        let ws = WebSocket::new(url).map_err(|e| format!("WebSocket connection failed: {:?}", e))?;

        let ws_for_open = ws.clone();
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            state.ws_connected.set(true);
            let subscribe = ClientMessage::Subscribe {
                events: EventKind::ALL.to_vec(),
            };
            if let Err(e) = send(&ws_for_open, &subscribe) {
                web_sys::console::error_1(&format!("Subscribe failed: {}", e).into());
            }
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                handle_message(&text, &state);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("WebSocket closed: code={}, reason={}", event.code(), event.reason()).into(),
            );
            state.ws_connected.set(false);
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Self {
            ws,
            handlers: RefCell::new(Some(Handlers {
                _on_open: on_open,
                _on_message: on_message,
                _on_close: on_close,
                _on_error: on_error,
            })),
            closed: Cell::new(false),
        })
    }

    /// Unsubscribe, detach every handler and close the socket. Runs once.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }

        if self.ws.ready_state() == WebSocket::OPEN {
            let unsubscribe = ClientMessage::Unsubscribe {
                events: EventKind::ALL.to_vec(),
            };
            if let Err(e) = send(&self.ws, &unsubscribe) {
                web_sys::console::warn_1(&format!("Unsubscribe failed: {}", e).into());
            }
        }

        // Handlers must be detached before their closures are dropped
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
        self.handlers.borrow_mut().take();

        let _ = self.ws.close();
    }
}

fn send(ws: &WebSocket, message: &ClientMessage) -> Result<(), String> {
    let json = serde_json::to_string(message).map_err(|e| e.to_string())?;
    ws.send_with_str(&json).map_err(|e| format!("{:?}", e))
}

/// Handle one incoming frame
fn handle_message(text: &str, state: &FeedState) {
    match decode_server_frame(text) {
        Ok(Inbound::Event(event)) => state.apply(&event),
        Ok(Inbound::Control(ServerMessage::Connected { connection_id })) => {
            web_sys::console::log_1(&format!("Connected with ID: {}", connection_id).into());
        }
        Ok(Inbound::Control(ServerMessage::Subscribed { events })) => {
            web_sys::console::log_1(&format!("Subscribed to: {:?}", events).into());
        }
        Ok(Inbound::Control(ServerMessage::Error { message })) => {
            web_sys::console::error_1(&format!("Server error: {}", message).into());
        }
        Ok(Inbound::Control(_)) => {}
        Err(e) if e.is_benign() => {
            web_sys::console::debug_1(&e.to_string().into());
        }
        Err(e) => {
            web_sys::console::warn_1(&format!("Dropping malformed event: {}", e).into());
        }
    }
}
