//! CLI command implementations.

pub mod chats;
pub mod init;
pub mod send;
pub mod watch;

use anyhow::{Context, Result};
use chat_client::{ClientConfig, HttpStore, MockStore};
use chat_types::{DeliveryStatus, Message, Origin, UserId};

/// Build the HTTP store described by the configuration.
fn http_store(config: &ClientConfig) -> Result<HttpStore> {
    config
        .http_store()
        .context("Invalid store configuration")
}

/// In-memory store with the demo chats seeded for the configured user.
fn mock_store(config: &ClientConfig) -> MockStore {
    MockStore::seeded(UserId::new(config.user.id))
}

/// One line of a printed thread: `[14:23] you: text (read)`.
fn format_message(message: &Message) -> String {
    let time = if message.time.is_empty() {
        "--:--"
    } else {
        message.time.as_str()
    };

    match message.origin {
        Origin::Mine => {
            let status = match message.status {
                DeliveryStatus::Sent => "sent",
                DeliveryStatus::Delivered => "delivered",
                DeliveryStatus::Read => "read",
            };
            format!("[{}] you: {} ({})", time, message.text, status)
        }
        Origin::Other => {
            let sender = message.sender.as_deref().unwrap_or("them");
            format!("[{}] {}: {}", time, sender, message.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_types::MessageId;

    fn message(origin: Origin, time: &str, status: DeliveryStatus) -> Message {
        Message {
            id: MessageId::new(5),
            text: "see you".into(),
            origin,
            time: time.into(),
            status,
            sender: Some("Anna".into()),
        }
    }

    #[test]
    fn formats_own_message_with_status() {
        let line = format_message(&message(Origin::Mine, "14:23", DeliveryStatus::Read));
        assert_eq!(line, "[14:23] you: see you (read)");
    }

    #[test]
    fn formats_peer_message_with_sender() {
        let line = format_message(&message(Origin::Other, "09:05", DeliveryStatus::Read));
        assert_eq!(line, "[09:05] Anna: see you");
    }

    #[test]
    fn optimistic_message_has_placeholder_time() {
        let line = format_message(&message(Origin::Mine, "", DeliveryStatus::Sent));
        assert_eq!(line, "[--:--] you: see you (sent)");
    }
}
