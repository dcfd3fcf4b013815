//! Message formatting utilities for client display.

use chatrelay_server::domain::OutboundMessage;
use chatrelay_shared::time::{Clock, timestamp_to_local_hms};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Decode one server frame and format it, stamped with the clock's current time
    pub fn format_frame(frame: &str, current_username: &str, clock: &dyn Clock) -> String {
        let received_at = timestamp_to_local_hms(clock.now_millis());
        match OutboundMessage::decode(frame) {
            Some(message) => Self::format_message(&message, current_username, &received_at),
            None => Self::format_raw_message(frame, &received_at),
        }
    }

    /// Format one server message for the terminal
    ///
    /// # Arguments
    ///
    /// * `message` - The decoded server message
    /// * `current_username` - The current user's name (to mark as "me")
    /// * `received_at` - Receive time already formatted (e.g., "12:34:56")
    pub fn format_message(
        message: &OutboundMessage,
        current_username: &str,
        received_at: &str,
    ) -> String {
        match message {
            OutboundMessage::UserList(names) => {
                Self::format_user_list(names, current_username, received_at)
            }
            OutboundMessage::SystemNotice(text) => format!("\n[{}] * {}\n", received_at, text),
            OutboundMessage::PublicChat { sender, body } => {
                format!("\n[{}] @{}: {}\n", received_at, sender, body)
            }
            OutboundMessage::DirectMessage { sender, body } => {
                format!("\n[{}] (DM) @{}: {}\n", received_at, sender, body)
            }
        }
    }

    /// Format the online-user list
    pub fn format_user_list(names: &[String], current_username: &str, received_at: &str) -> String {
        if names.is_empty() {
            return format!("\n[{}] Online: (No participants)\n", received_at);
        }

        let listed: Vec<String> = names
            .iter()
            .map(|name| {
                if name == current_username {
                    format!("{} (me)", name)
                } else {
                    name.clone()
                }
            })
            .collect();
        format!(
            "\n[{}] Online ({}): {}\n",
            received_at,
            names.len(),
            listed.join(", ")
        )
    }

    /// Format a frame that matched none of the known layouts
    pub fn format_raw_message(text: &str, received_at: &str) -> String {
        format!("\n[{}] {}\n", received_at, text)
    }
}

#[cfg(test)]
mod tests {
    use chatrelay_shared::time::FixedClock;

    use super::*;

    #[test]
    fn test_format_frame_stamps_receive_time() {
        // テスト項目: 受信したフレームが時計の時刻付きで表示される
        // given (前提条件):
        let clock = FixedClock::new(1672576496000);
        let expected_time = timestamp_to_local_hms(1672576496000);

        // when (操作):
        let result = MessageFormatter::format_frame("alice: hello", "bob", &clock);

        // then (期待する結果):
        assert_eq!(result, format!("\n[{}] @alice: hello\n", expected_time));
    }

    #[test]
    fn test_format_frame_direct_message() {
        // テスト項目: DM フレームが DM として表示される
        // given (前提条件):
        let clock = FixedClock::new(0);
        let expected_time = timestamp_to_local_hms(0);

        // when (操作):
        let result = MessageFormatter::format_frame("DM|alice|psst", "bob", &clock);

        // then (期待する結果):
        assert_eq!(result, format!("\n[{}] (DM) @alice: psst\n", expected_time));
    }

    #[test]
    fn test_format_user_list_marks_me() {
        // テスト項目: ユーザー一覧で自分に "(me)" が付く
        // given (前提条件):
        let names = vec!["alice".to_string(), "bob".to_string()];

        // when (操作):
        let result = MessageFormatter::format_user_list(&names, "bob", "12:00:00");

        // then (期待する結果):
        assert_eq!(result, "\n[12:00:00] Online (2): alice, bob (me)\n");
    }

    #[test]
    fn test_format_empty_user_list() {
        // テスト項目: 空のユーザー一覧は "(No participants)" と表示される
        // given (前提条件):
        let names: Vec<String> = Vec::new();

        // when (操作):
        let result = MessageFormatter::format_user_list(&names, "bob", "12:00:00");

        // then (期待する結果):
        assert!(result.contains("(No participants)"));
    }

    #[test]
    fn test_format_public_and_direct_messages() {
        // テスト項目: 公開メッセージと DM が区別して表示される
        // given (前提条件):
        let public = OutboundMessage::PublicChat {
            sender: "alice".to_string(),
            body: "hello".to_string(),
        };
        let direct = OutboundMessage::DirectMessage {
            sender: "alice".to_string(),
            body: "psst".to_string(),
        };

        // when (操作):
        let public_line = MessageFormatter::format_message(&public, "bob", "12:00:00");
        let direct_line = MessageFormatter::format_message(&direct, "bob", "12:00:01");

        // then (期待する結果):
        assert_eq!(public_line, "\n[12:00:00] @alice: hello\n");
        assert_eq!(direct_line, "\n[12:00:01] (DM) @alice: psst\n");
    }

    #[test]
    fn test_format_system_notice() {
        // テスト項目: システム通知は "*" 付きで表示される
        // given (前提条件):
        let notice = OutboundMessage::SystemNotice("bob left the chat.".to_string());

        // when (操作):
        let result = MessageFormatter::format_message(&notice, "alice", "12:00:00");

        // then (期待する結果):
        assert_eq!(result, "\n[12:00:00] * bob left the chat.\n");
    }
}
