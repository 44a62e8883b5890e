//! Wire protocol for the chat WebSocket.
//!
//! Every frame is one JSON text message tagged by its `type` field. A
//! frame whose declared payload field is missing for its type fails
//! deserialization and is dropped as malformed rather than crashing the
//! connection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named chat channel. The server is authoritative for membership
/// and history; this is only the identifier the client passes around.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

/// Room identifier validation error
#[derive(Debug, Error, PartialEq, Eq)]
#[error("room id must not be empty")]
pub struct InvalidRoomId;

impl RoomId {
    /// Create a room id, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidRoomId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidRoomId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user as it appears in presence and typing frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: String,
    pub display_name: String,
}

/// A chat message as pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: ChatUser,
    pub content: String,
    /// Unix timestamp in milliseconds (UTC).
    pub sent_at: i64,
}

/// Client → server frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    JoinRoom { room: RoomId },
    LeaveRoom { room: RoomId },
    Message { room: RoomId, content: String },
    Typing { room: RoomId },
    Ping,
}

/// Server → client frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Message { room: RoomId, message: ChatMessage },
    UserJoined { room: RoomId, user: ChatUser },
    UserLeft { room: RoomId, user: ChatUser },
    Typing { room: RoomId, user: ChatUser },
    OnlineUsers { room: RoomId, users: Vec<ChatUser> },
    Error { error: String },
    Pong,
}

/// Encode an outbound frame as a JSON text payload.
pub fn encode_frame(frame: &ClientFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

/// Decode one inbound text payload.
///
/// Malformed JSON, unknown types, and frames missing their required
/// fields all come back as `None`, logged once. They never invoke a
/// callback and never tear down the connection.
pub fn decode_frame(text: &str) -> Option<ServerFrame> {
    match serde_json::from_str(text) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!("dropping malformed frame: {}", e);
            None
        }
    }
}
