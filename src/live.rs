//! Live Update Channel
//!
//! Websocket subscription to the backend push channel. Frames are validated
//! into [`FeedEvent`]s here, at the boundary; malformed payloads are logged
//! and dropped so they never reach the reducer.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::feed::{decode_server_frame, ClientMessage, EventKind, FeedEvent, Inbound, ServerMessage};

/// Source of validated feed events for one session
#[async_trait]
pub trait EventChannel: Send {
    /// Next event, or `None` once the channel has closed.
    ///
    /// Must be cancel-safe: the session polls it inside `select!`.
    async fn recv(&mut self) -> Option<FeedEvent>;

    /// Deregister from every event kind and close the connection
    async fn close(&mut self);
}

/// `None` stands for a channel that could not be opened: it yields
/// nothing and closing it is a no-op.
#[async_trait]
impl<C: EventChannel> EventChannel for Option<C> {
    async fn recv(&mut self) -> Option<FeedEvent> {
        match self {
            Some(channel) => channel.recv().await,
            None => None,
        }
    }

    async fn close(&mut self) {
        if let Some(channel) = self {
            channel.close().await;
        }
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Push channel over a websocket
pub struct WsChannel {
    socket: Socket,
    events: Vec<EventKind>,
    connection_id: Option<String>,
    open: bool,
    closed: bool,
}

impl WsChannel {
    /// Connect and subscribe to `events`, returning once the server has
    /// acknowledged the subscription
    pub async fn connect(url: &str, events: &[EventKind]) -> Result<Self, LiveError> {
        let (socket, _) = connect_async(url).await?;
        let mut channel = Self {
            socket,
            events: events.to_vec(),
            connection_id: None,
            open: true,
            closed: false,
        };

        channel
            .send(&ClientMessage::Subscribe {
                events: channel.events.clone(),
            })
            .await?;

        while let Some(frame) = channel.socket.next().await {
            let text = match frame? {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match decode_server_frame(&text) {
                Ok(Inbound::Control(ServerMessage::Connected { connection_id })) => {
                    tracing::debug!(connection_id = %connection_id, "Push channel connected");
                    channel.connection_id = Some(connection_id);
                }
                Ok(Inbound::Control(ServerMessage::Subscribed { events })) => {
                    tracing::info!(url = %url, events = ?events, "Subscribed to push channel");
                    return Ok(channel);
                }
                Ok(Inbound::Control(ServerMessage::Error { message })) => {
                    return Err(LiveError::Rejected(message));
                }
                Ok(other) => {
                    tracing::trace!(frame = ?other, "Ignoring frame before subscription");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring undecodable frame before subscription");
                }
            }
        }

        Err(LiveError::Closed)
    }

    /// Connection id assigned by the server, if it sent one
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), LiveError> {
        let text = serde_json::to_string(message)?;
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }
}

#[async_trait]
impl EventChannel for WsChannel {
    async fn recv(&mut self) -> Option<FeedEvent> {
        if !self.open {
            return None;
        }

        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Text(text)) => match decode_server_frame(&text) {
                    Ok(Inbound::Event(event)) => return Some(event),
                    Ok(Inbound::Control(ServerMessage::Error { message })) => {
                        tracing::warn!(message = %message, "Push channel reported an error");
                    }
                    Ok(Inbound::Control(other)) => {
                        tracing::trace!(frame = ?other, "Control frame");
                    }
                    Err(e) if e.is_benign() => {
                        tracing::debug!(error = %e, "Event ignored");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, frame = %text, "Dropping malformed event");
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::info!(frame = ?frame, "Push channel closed by server");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Push channel receive error");
                    break;
                }
            }
        }

        self.open = false;
        None
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if self.open {
            let unsubscribe = ClientMessage::Unsubscribe {
                events: self.events.clone(),
            };
            if let Err(e) = self.send(&unsubscribe).await {
                tracing::debug!(error = %e, "Unsubscribe failed");
            }
        }
        self.open = false;

        if let Err(e) = self.socket.close(None).await {
            tracing::debug!(error = %e, "Websocket close failed");
        }
        tracing::info!("Push channel closed");
    }
}

/// Errors raised by the push channel
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Websocket error: {0}")]
    Websocket(#[from] tungstenite::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Subscription rejected: {0}")]
    Rejected(String),

    #[error("Channel closed before subscription was acknowledged")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::accept_async;

    #[tokio::test]
    async fn test_subscribe_then_receive_valid_events_only() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            let subscribe = ws.next().await.unwrap().unwrap();
            let subscribe: ClientMessage =
                serde_json::from_str(subscribe.to_text().unwrap()).unwrap();
            assert_eq!(
                subscribe,
                ClientMessage::Subscribe {
                    events: EventKind::ALL.to_vec()
                }
            );

            let frames = [
                r#"{"type":"connected","connection_id":"abc"}"#,
                r#"{"type":"subscribed","events":["comment","engagement","post_created","post_removed"]}"#,
                r#"{"type":"event","event":"engagement","data":{"postId":"p1","likes":1}}"#,
                r#"{"type":"event","event":"comment","data":{"verb":"add"}}"#,
                r#"{"type":"event","event":"post_removed","data":{"postId":"p2"}}"#,
            ];
            for frame in frames {
                ws.send(Message::Text(frame.to_string())).await.unwrap();
            }

            // Unsubscribe arrives on teardown
            let unsubscribe = ws.next().await.unwrap().unwrap();
            let unsubscribe: ClientMessage =
                serde_json::from_str(unsubscribe.to_text().unwrap()).unwrap();
            assert!(matches!(unsubscribe, ClientMessage::Unsubscribe { .. }));
        });

        let url = format!("ws://{}", addr);
        let mut channel = WsChannel::connect(&url, &EventKind::ALL).await.unwrap();
        assert_eq!(channel.connection_id(), Some("abc"));

        let event = channel.recv().await.unwrap();
        assert_eq!(
            event,
            FeedEvent::PostRemoved {
                post_id: "p2".to_string()
            }
        );

        channel.close().await;
        channel.close().await;
        assert!(channel.recv().await.is_none());

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_subscription() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await;
            ws.send(Message::Text(r#"{"type":"error","message":"full"}"#.to_string()))
                .await
                .unwrap();
        });

        let result = WsChannel::connect(&format!("ws://{}", addr), &EventKind::ALL).await;
        assert!(matches!(result, Err(LiveError::Rejected(m)) if m == "full"));
    }
}
