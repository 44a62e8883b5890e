//! Chat room endpoints: listing, history, read state, membership.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiError;

/// One room in the sidebar listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    /// Messages the caller has not read yet.
    pub unread_count: u64,
    /// Whether the caller is a member of this room.
    pub is_member: bool,
}

/// One message as stored by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomMessage {
    pub id: Uuid,
    pub room: String,
    pub sender: String,
    pub content: String,
    /// Unix timestamp in milliseconds (UTC).
    pub sent_at: i64,
}

/// One page of room history, fetched backward from the newest message.
///
/// `next_cursor` is an opaque pointer to the page of older messages;
/// `None` means the beginning of the room's history was reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagePage {
    pub messages: Vec<RoomMessage>,
    pub next_cursor: Option<String>,
}

impl ApiClient {
    /// List the rooms visible to the caller, with unread counts.
    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, ApiError> {
        self.get_json("/rooms").await
    }

    /// Fetch one page of a room's message history.
    ///
    /// Pass `cursor = None` for the newest page; feed back `next_cursor`
    /// from the previous page to walk older history.
    pub async fn room_history(
        &self,
        room: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<MessagePage, ApiError> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        self.get_json_with_query(&format!("/rooms/{room}/messages"), &query)
            .await
    }

    /// Mark every message in the room as read for the caller.
    pub async fn mark_room_read(&self, room: &str) -> Result<(), ApiError> {
        self.post_unit(&format!("/rooms/{room}/read")).await
    }

    /// Become a member of the room.
    pub async fn join_room(&self, room: &str) -> Result<(), ApiError> {
        self.post_unit(&format!("/rooms/{room}/join")).await
    }

    /// Give up membership of the room.
    pub async fn leave_room(&self, room: &str) -> Result<(), ApiError> {
        self.post_unit(&format!("/rooms/{room}/leave")).await
    }
}
