//! Event formatting for terminal display.

use matcha_shared::time::timestamp_to_rfc3339;

use crate::event::ChatEvent;
use crate::protocol::ChatUser;

/// Renders chat events as terminal lines.
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format one event, or `None` for events the terminal UI does not
    /// render (connection state is shown by the prompt instead).
    pub fn format_event(event: &ChatEvent) -> Option<String> {
        match event {
            ChatEvent::Connected => Some("\n* connected\n".to_string()),
            ChatEvent::Disconnected => Some("\n* disconnected\n".to_string()),
            ChatEvent::Message { room, message } => Some(format!(
                "\n[{}] {} ({}): {}\n",
                room,
                message.sender.display_name,
                timestamp_to_rfc3339(message.sent_at),
                message.content
            )),
            ChatEvent::UserJoined { room, user } => {
                Some(format!("\n[{}] + {} joined\n", room, user.display_name))
            }
            ChatEvent::UserLeft { room, user } => {
                Some(format!("\n[{}] - {} left\n", room, user.display_name))
            }
            ChatEvent::Typing { room, user } => {
                Some(format!("\n[{}] {} is typing...\n", room, user.display_name))
            }
            ChatEvent::OnlineUsers { room, users } => {
                Some(Self::format_online_users(room.as_str(), users))
            }
            ChatEvent::ServerError { message } => Some(format!("\n! server error: {}\n", message)),
        }
    }

    fn format_online_users(room: &str, users: &[ChatUser]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n[{}] online now:\n", room));
        if users.is_empty() {
            output.push_str("(nobody)\n");
        } else {
            for user in users {
                output.push_str(&format!("  {}\n", user.display_name));
            }
        }
        output
    }
}
