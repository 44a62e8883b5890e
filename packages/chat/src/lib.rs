//! Real-time chat client for the Matcha HR platform.
//!
//! The connection manager ([`session::ChatSession`]) owns exactly one
//! WebSocket to the chat backend, reconnects while an access credential
//! exists, and routes inbound frames to a single [`event::EventSink`].
//! [`room::RoomSession`] layers per-room semantics on top: history
//! before join, mark-as-read, leave on exit.

pub mod credential;
pub mod event;
pub mod formatter;
pub mod protocol;
pub mod room;
pub mod session;
pub mod ui;

pub use credential::CredentialStore;
pub use event::{ChatEvent, ChannelSink, EventSink};
pub use protocol::{ClientFrame, RoomId, ServerFrame};
pub use session::{ChatSession, ConnectionState, SessionConfig};
