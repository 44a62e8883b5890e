//! Inbound event delivery.
//!
//! Consumers receive every event through one method taking the tagged
//! variant, instead of a bag of optional per-type callbacks. Events not
//! meaningful to the consumer are simply matched away.

use tokio::sync::mpsc;

use crate::protocol::{ChatMessage, ChatUser, RoomId, ServerFrame};

/// Everything the session can tell its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The socket opened. Emitted on every (re)connect.
    Connected,
    /// The socket closed. Reconnection, if any, is invisible beyond the
    /// session's state watch.
    Disconnected,
    Message { room: RoomId, message: ChatMessage },
    UserJoined { room: RoomId, user: ChatUser },
    UserLeft { room: RoomId, user: ChatUser },
    Typing { room: RoomId, user: ChatUser },
    OnlineUsers { room: RoomId, users: Vec<ChatUser> },
    /// Application-level error frame relayed by the server.
    ServerError { message: String },
}

impl ServerFrame {
    /// Map a decoded frame to its consumer-facing event.
    ///
    /// `pong` is the heartbeat acknowledgement and stays inside the
    /// session, so it maps to `None`.
    pub fn into_event(self) -> Option<ChatEvent> {
        match self {
            ServerFrame::Message { room, message } => Some(ChatEvent::Message { room, message }),
            ServerFrame::UserJoined { room, user } => Some(ChatEvent::UserJoined { room, user }),
            ServerFrame::UserLeft { room, user } => Some(ChatEvent::UserLeft { room, user }),
            ServerFrame::Typing { room, user } => Some(ChatEvent::Typing { room, user }),
            ServerFrame::OnlineUsers { room, users } => {
                Some(ChatEvent::OnlineUsers { room, users })
            }
            ServerFrame::Error { error } => Some(ChatEvent::ServerError { message: error }),
            ServerFrame::Pong => None,
        }
    }
}

/// Single consumer interface for session events.
///
/// Delivery happens on the session task, in transport order; `deliver`
/// must not block.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: ChatEvent);
}

/// [`EventSink`] adapter pushing events into an unbounded channel.
///
/// The receiving half is what a UI (or a test) consumes.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ChatEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: ChatEvent) {
        // A consumer that dropped its receiver no longer cares.
        let _ = self.tx.send(event);
    }
}
