//! Push Channel Protocol
//!
//! Message formats exchanged over the live-update websocket, and the typed
//! feed events that payloads are validated into at the channel boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::model::{Comment, Post};

/// The four event kinds a feed subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Comment,
    Engagement,
    PostCreated,
    PostRemoved,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Comment,
        EventKind::Engagement,
        EventKind::PostCreated,
        EventKind::PostRemoved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Comment => "comment",
            EventKind::Engagement => "engagement",
            EventKind::PostCreated => "post_created",
            EventKind::PostRemoved => "post_removed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EventError::UnknownKind(s.to_string()))
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register interest in event kinds
    Subscribe { events: Vec<EventKind> },
    /// Drop interest in event kinds
    Unsubscribe { events: Vec<EventKind> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { connection_id: String },
    /// Subscription confirmed
    Subscribed { events: Vec<EventKind> },
    /// Unsubscription confirmed
    Unsubscribed { events: Vec<EventKind> },
    /// A feed event. `data` is validated by [`FeedEvent::decode`].
    Event { event: String, data: Value },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
}

impl ServerMessage {
    /// Wrap a typed event for the wire
    pub fn event(event: &FeedEvent) -> Result<Self, EventError> {
        Ok(ServerMessage::Event {
            event: event.kind().as_str().to_string(),
            data: event.to_payload()?,
        })
    }
}

/// What a comment event asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentVerb {
    Remove,
    /// Any verb other than `remove` ("add", "edit", ...)
    Upsert(String),
}

impl CommentVerb {
    fn parse(verb: Option<String>) -> Self {
        match verb {
            Some(v) if v == "remove" => CommentVerb::Remove,
            Some(v) => CommentVerb::Upsert(v),
            None => CommentVerb::Upsert("add".to_string()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            CommentVerb::Remove => "remove",
            CommentVerb::Upsert(v) => v,
        }
    }
}

/// A validated feed event, one variant per event kind
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Comment {
        post_id: String,
        verb: CommentVerb,
        comment: Comment,
    },
    /// Authoritative counter snapshot
    Engagement {
        post_id: String,
        likes: u64,
        comments_count: u64,
    },
    PostCreated { post: Post },
    PostRemoved { post_id: String },
}

// Wire payloads. Only the comment event has optional fields; the other
// kinds fail to decode when a field is missing.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<Comment>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngagementPayload {
    post_id: String,
    likes: u64,
    comments_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PostCreatedPayload {
    post: Post,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRemovedPayload {
    post_id: String,
}

impl FeedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FeedEvent::Comment { .. } => EventKind::Comment,
            FeedEvent::Engagement { .. } => EventKind::Engagement,
            FeedEvent::PostCreated { .. } => EventKind::PostCreated,
            FeedEvent::PostRemoved { .. } => EventKind::PostRemoved,
        }
    }

    /// Id of the post this event targets
    pub fn post_id(&self) -> &str {
        match self {
            FeedEvent::Comment { post_id, .. }
            | FeedEvent::Engagement { post_id, .. }
            | FeedEvent::PostRemoved { post_id } => post_id,
            FeedEvent::PostCreated { post } => &post.id,
        }
    }

    /// Validate a named payload into a typed event.
    ///
    /// A comment event without a post id or comment is [`EventError::Incomplete`],
    /// which callers treat as a silent no-op. Anything else that fails is
    /// [`EventError::Malformed`] or [`EventError::UnknownKind`].
    pub fn decode(event: &str, data: Value) -> Result<Self, EventError> {
        let kind: EventKind = event.parse()?;

        let decoded = match kind {
            EventKind::Comment => {
                let payload: CommentPayload = from_payload(kind, data)?;
                match (payload.post_id, payload.comment) {
                    (Some(post_id), Some(comment)) if !post_id.is_empty() => FeedEvent::Comment {
                        post_id,
                        verb: CommentVerb::parse(payload.verb),
                        comment,
                    },
                    _ => return Err(EventError::Incomplete(kind)),
                }
            }
            EventKind::Engagement => {
                let payload: EngagementPayload = from_payload(kind, data)?;
                FeedEvent::Engagement {
                    post_id: payload.post_id,
                    likes: payload.likes,
                    comments_count: payload.comments_count,
                }
            }
            EventKind::PostCreated => {
                let payload: PostCreatedPayload = from_payload(kind, data)?;
                FeedEvent::PostCreated { post: payload.post }
            }
            EventKind::PostRemoved => {
                let payload: PostRemovedPayload = from_payload(kind, data)?;
                FeedEvent::PostRemoved {
                    post_id: payload.post_id,
                }
            }
        };

        if decoded.post_id().is_empty() {
            return Err(EventError::Malformed {
                kind,
                reason: "empty post id".to_string(),
            });
        }
        Ok(decoded)
    }

    /// Encode the event back into its wire payload
    pub fn to_payload(&self) -> Result<Value, EventError> {
        let value = match self {
            FeedEvent::Comment {
                post_id,
                verb,
                comment,
            } => serde_json::to_value(CommentPayload {
                post_id: Some(post_id.clone()),
                verb: Some(verb.as_str().to_string()),
                comment: Some(comment.clone()),
            }),
            FeedEvent::Engagement {
                post_id,
                likes,
                comments_count,
            } => serde_json::to_value(EngagementPayload {
                post_id: post_id.clone(),
                likes: *likes,
                comments_count: *comments_count,
            }),
            FeedEvent::PostCreated { post } => {
                serde_json::to_value(PostCreatedPayload { post: post.clone() })
            }
            FeedEvent::PostRemoved { post_id } => serde_json::to_value(PostRemovedPayload {
                post_id: post_id.clone(),
            }),
        };
        value.map_err(|e| EventError::Malformed {
            kind: self.kind(),
            reason: e.to_string(),
        })
    }
}

fn from_payload<T: serde::de::DeserializeOwned>(kind: EventKind, data: Value) -> Result<T, EventError> {
    serde_json::from_value(data).map_err(|e| EventError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

/// A decoded websocket text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(FeedEvent),
    Control(ServerMessage),
}

/// Decode a server text frame, validating event payloads
pub fn decode_server_frame(text: &str) -> Result<Inbound, EventError> {
    let message: ServerMessage =
        serde_json::from_str(text).map_err(|e| EventError::Frame(e.to_string()))?;
    match message {
        ServerMessage::Event { event, data } => FeedEvent::decode(&event, data).map(Inbound::Event),
        control => Ok(Inbound::Control(control)),
    }
}

/// Errors raised while decoding channel traffic
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("Invalid frame: {0}")]
    Frame(String),

    #[error("Unknown event kind: {0}")]
    UnknownKind(String),

    #[error("Incomplete {0} event ignored")]
    Incomplete(EventKind),

    #[error("Malformed {kind} event: {reason}")]
    Malformed { kind: EventKind, reason: String },
}

impl EventError {
    /// Incomplete comment events are expected traffic, not faults
    pub fn is_benign(&self) -> bool {
        matches!(self, EventError::Incomplete(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_comment_add() {
        let event = FeedEvent::decode(
            "comment",
            json!({"postId": "p1", "verb": "add", "comment": {"id": "c1", "text": "hi", "username": "u"}}),
        )
        .unwrap();
        match event {
            FeedEvent::Comment { post_id, verb, comment } => {
                assert_eq!(post_id, "p1");
                assert_eq!(verb, CommentVerb::Upsert("add".to_string()));
                assert_eq!(comment.id, "c1");
            }
            _ => panic!("Expected Comment"),
        }
    }

    #[test]
    fn test_decode_comment_without_target_is_incomplete() {
        let err = FeedEvent::decode("comment", json!({"verb": "add", "comment": {"id": "c1"}}))
            .unwrap_err();
        assert_eq!(err, EventError::Incomplete(EventKind::Comment));
        assert!(err.is_benign());

        let err = FeedEvent::decode("comment", json!({"postId": "p1"})).unwrap_err();
        assert!(err.is_benign());
    }

    #[test]
    fn test_decode_remove_verb() {
        let event = FeedEvent::decode(
            "comment",
            json!({"postId": "p1", "verb": "remove", "comment": {"id": "c1"}}),
        )
        .unwrap();
        assert!(matches!(event, FeedEvent::Comment { verb: CommentVerb::Remove, .. }));
    }

    #[test]
    fn test_decode_engagement_requires_all_fields() {
        let event = FeedEvent::decode(
            "engagement",
            json!({"postId": "p1", "likes": 10, "commentsCount": 1}),
        )
        .unwrap();
        assert_eq!(
            event,
            FeedEvent::Engagement {
                post_id: "p1".to_string(),
                likes: 10,
                comments_count: 1
            }
        );

        let err = FeedEvent::decode("engagement", json!({"postId": "p1", "likes": 10})).unwrap_err();
        assert!(matches!(err, EventError::Malformed { kind: EventKind::Engagement, .. }));

        let err = FeedEvent::decode(
            "engagement",
            json!({"postId": "p1", "likes": -1, "commentsCount": 0}),
        )
        .unwrap_err();
        assert!(!err.is_benign());
    }

    #[test]
    fn test_decode_post_events() {
        let created = FeedEvent::decode("post_created", json!({"post": {"id": "p9"}})).unwrap();
        assert_eq!(created.post_id(), "p9");

        let removed = FeedEvent::decode("post_removed", json!({"postId": "p9"})).unwrap();
        assert_eq!(removed.kind(), EventKind::PostRemoved);

        assert!(FeedEvent::decode("post_removed", json!({})).is_err());
        assert!(FeedEvent::decode("post_removed", json!({"postId": ""})).is_err());
        assert!(FeedEvent::decode("post_created", json!({"post": {"caption": "x"}})).is_err());
    }

    #[test]
    fn test_decode_unknown_kind() {
        let err = FeedEvent::decode("story_created", json!({})).unwrap_err();
        assert_eq!(err, EventError::UnknownKind("story_created".to_string()));
    }

    #[test]
    fn test_server_frame_round_trip_for_event() {
        let event = FeedEvent::PostRemoved {
            post_id: "p2".to_string(),
        };
        let text = serde_json::to_string(&ServerMessage::event(&event).unwrap()).unwrap();
        assert!(text.contains("\"type\":\"event\""));
        assert!(text.contains("\"event\":\"post_removed\""));
        assert_eq!(decode_server_frame(&text).unwrap(), Inbound::Event(event));
    }

    #[test]
    fn test_server_frame_control_messages() {
        let inbound = decode_server_frame(r#"{"type":"subscribed","events":["comment","engagement"]}"#)
            .unwrap();
        assert_eq!(
            inbound,
            Inbound::Control(ServerMessage::Subscribed {
                events: vec![EventKind::Comment, EventKind::Engagement]
            })
        );
        assert!(matches!(decode_server_frame("not json"), Err(EventError::Frame(_))));
    }

    #[test]
    fn test_client_message_serialize_subscribe() {
        let msg = ClientMessage::Subscribe {
            events: EventKind::ALL.to_vec(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"subscribe","events":["comment","engagement","post_created","post_removed"]}"#
        );
    }
}
