//! Follow a conversation.

use anyhow::Result;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::watch;

use chat_client::{ChatClient, ClientConfig, MessageStore, ViewSnapshot};
use chat_types::{ConversationId, MessageId};

use super::{format_message, http_store, mock_store};

/// Run the watch command.
///
/// Prints the thread once it loads, then every new message, until Ctrl-C or
/// until `duration` elapses.
pub async fn run(
    config: &ClientConfig,
    conversation: ConversationId,
    duration: Option<Duration>,
    use_mock: bool,
) -> Result<()> {
    if use_mock {
        let client = ChatClient::new(config.chat_config(), mock_store(config));
        do_watch(client, conversation, duration).await
    } else {
        let client = ChatClient::new(config.chat_config(), http_store(config)?);
        do_watch(client, conversation, duration).await
    }
}

/// Common watch logic for any store.
async fn do_watch<S: MessageStore + 'static>(
    client: ChatClient<S>,
    conversation: ConversationId,
    duration: Option<Duration>,
) -> Result<()> {
    let mut updates = client.subscribe();
    client.activate(conversation).await;
    println!("Watching conversation {} (Ctrl-C to stop)", conversation);

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut printer = ThreadPrinter::default();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = latest(&mut updates);
                if let Some(snapshot) = snapshot {
                    for line in printer.new_lines(&snapshot) {
                        println!("{}", line);
                    }
                }
            }
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.deactivate().await;
    Ok(())
}

fn latest(updates: &mut watch::Receiver<Option<ViewSnapshot>>) -> Option<ViewSnapshot> {
    updates.borrow_and_update().clone()
}

/// Tracks what has been printed so each message appears once.
#[derive(Debug, Default)]
struct ThreadPrinter {
    printed: HashSet<MessageId>,
    loaded: bool,
    typing: bool,
}

impl ThreadPrinter {
    /// Lines to print for `snapshot` that were not printed before.
    fn new_lines(&mut self, snapshot: &ViewSnapshot) -> Vec<String> {
        let mut lines = Vec::new();
        if snapshot.loading {
            return lines;
        }
        if !self.loaded {
            self.loaded = true;
            if snapshot.messages.is_empty() {
                lines.push("No messages yet.".to_string());
            }
        }

        for message in &snapshot.messages {
            // Optimistic entries are printed once the store confirms them.
            if message.is_optimistic() || !self.printed.insert(message.id) {
                continue;
            }
            lines.push(format_message(message));
        }

        if snapshot.peer_typing && !self.typing {
            lines.push("... typing".to_string());
        }
        self.typing = snapshot.peer_typing;
        lines
    }
}
