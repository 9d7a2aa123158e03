//! List conversations.

use anyhow::{Context, Result};
use chat_client::{ChatClient, ClientConfig, MessageStore};

use super::{http_store, mock_store};

/// Run the chats command.
pub async fn run(config: &ClientConfig, use_mock: bool) -> Result<()> {
    if use_mock {
        let client = ChatClient::new(config.chat_config(), mock_store(config));
        do_list(client).await
    } else {
        let client = ChatClient::new(config.chat_config(), http_store(config)?);
        do_list(client).await
    }
}

/// Common listing logic for any store.
async fn do_list<S: MessageStore + 'static>(client: ChatClient<S>) -> Result<()> {
    let chats = client
        .list_conversations()
        .await
        .context("Failed to load conversations")?;

    if chats.is_empty() {
        println!("No conversations. Run 'chatsync init' to create some.");
        return Ok(());
    }

    for chat in &chats {
        let unread = if chat.unread > 0 {
            format!(" [{} unread]", chat.unread)
        } else {
            String::new()
        };
        println!(
            "{:>4}  {:<16} {:>5}  {}{}",
            chat.id.value(),
            chat.name,
            chat.time,
            chat.last_message,
            unread
        );
    }

    Ok(())
}
