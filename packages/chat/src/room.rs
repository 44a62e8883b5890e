//! Per-room session handling on top of the live connection and the
//! rooms REST API.
//!
//! A live-pushed message that arrives before the historical page has
//! landed would be appended ahead of it and show up duplicated or out
//! of order. [`RoomSession`] therefore never issues the WebSocket join
//! until the history fetch for the room has resolved: `enter` runs the
//! two strictly in sequence, and `join_live` (for explicit re-joins
//! after a reconnect) refuses while the one-shot gate is unset.

use std::sync::Arc;

use async_trait::async_trait;

use matcha_api::rooms::{MessagePage, RoomMessage};
use matcha_api::{ApiClient, ApiError};

use crate::protocol::RoomId;
use crate::session::ChatSession;

/// Messages fetched per history page.
pub const HISTORY_PAGE_SIZE: u32 = 50;

/// REST side of a room: history and read state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn history(
        &self,
        room: &RoomId,
        cursor: Option<String>,
    ) -> Result<MessagePage, ApiError>;

    async fn mark_read(&self, room: &RoomId) -> Result<(), ApiError>;
}

#[async_trait]
impl RoomDirectory for ApiClient {
    async fn history(
        &self,
        room: &RoomId,
        cursor: Option<String>,
    ) -> Result<MessagePage, ApiError> {
        self.room_history(room.as_str(), cursor.as_deref(), HISTORY_PAGE_SIZE)
            .await
    }

    async fn mark_read(&self, room: &RoomId) -> Result<(), ApiError> {
        self.mark_room_read(room.as_str()).await
    }
}

/// Live (WebSocket) side of a room.
#[cfg_attr(test, mockall::automock)]
pub trait LiveRoom: Send + Sync {
    fn join(&self, room: &RoomId);
    fn leave(&self, room: &RoomId);
    fn message(&self, room: &RoomId, content: &str);
    fn typing(&self, room: &RoomId);
}

impl LiveRoom for ChatSession {
    fn join(&self, room: &RoomId) {
        self.join_room(room);
    }

    fn leave(&self, room: &RoomId) {
        self.leave_room(room);
    }

    fn message(&self, room: &RoomId, content: &str) {
        self.send_message(room, content);
    }

    fn typing(&self, room: &RoomId) {
        self.send_typing(room);
    }
}

/// One open room: joined live while entered, history paged backward on
/// demand.
pub struct RoomSession {
    live: Arc<dyn LiveRoom>,
    directory: Arc<dyn RoomDirectory>,
    room: RoomId,
    history_loaded: bool,
    next_cursor: Option<String>,
    reached_start: bool,
}

impl RoomSession {
    pub fn new(live: Arc<dyn LiveRoom>, directory: Arc<dyn RoomDirectory>, room: RoomId) -> Self {
        Self {
            live,
            directory,
            room,
            history_loaded: false,
            next_cursor: None,
            reached_start: false,
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Enter the room: fetch the newest history page, then join live
    /// events, then mark the room read.
    ///
    /// Returns the newest page, oldest-first as served.
    pub async fn enter(&mut self) -> Result<Vec<RoomMessage>, ApiError> {
        let page = self.directory.history(&self.room, None).await?;
        self.next_cursor = page.next_cursor.clone();
        self.reached_start = page.next_cursor.is_none();
        self.history_loaded = true;

        self.live.join(&self.room);
        self.directory.mark_read(&self.room).await?;

        Ok(page.messages)
    }

    /// Re-issue the live join, e.g. after the session reconnected.
    ///
    /// Suppressed until `enter` has loaded history at least once.
    pub fn join_live(&self) {
        if !self.history_loaded {
            tracing::warn!(
                "suppressing join for room '{}': history not loaded yet",
                self.room
            );
            return;
        }
        self.live.join(&self.room);
    }

    /// Fetch the next page of older messages. Returns an empty page once
    /// the beginning of the room's history has been reached.
    pub async fn load_older(&mut self) -> Result<Vec<RoomMessage>, ApiError> {
        if self.reached_start {
            return Ok(Vec::new());
        }
        let page = self
            .directory
            .history(&self.room, self.next_cursor.clone())
            .await?;
        self.next_cursor = page.next_cursor.clone();
        self.reached_start = page.next_cursor.is_none();
        Ok(page.messages)
    }

    pub fn send(&self, content: &str) {
        self.live.message(&self.room, content);
    }

    pub fn typing(&self) {
        self.live.typing(&self.room);
    }

    /// Leave the room's live events.
    pub fn leave(&self) {
        self.live.leave(&self.room);
    }
}
