//! Send a message to a conversation.

use anyhow::{Context, Result};
use chat_client::{ChatClient, ClientConfig, MessageStore, SendOutcome};
use chat_types::ConversationId;

use super::{format_message, http_store, mock_store};

/// Run the send command.
pub async fn run(
    config: &ClientConfig,
    conversation: ConversationId,
    text: &str,
    use_mock: bool,
) -> Result<()> {
    if use_mock {
        let client = ChatClient::new(config.chat_config(), mock_store(config));
        do_send(client, conversation, text).await
    } else {
        let client = ChatClient::new(config.chat_config(), http_store(config)?);
        do_send(client, conversation, text).await
    }
}

/// Common send logic for any store.
async fn do_send<S: MessageStore + 'static>(
    client: ChatClient<S>,
    conversation: ConversationId,
    text: &str,
) -> Result<()> {
    client.activate(conversation).await;

    let outcome = client
        .send_message(text)
        .await
        .context("Failed to send message");
    let thread = client.snapshot();
    client.deactivate().await;

    match outcome? {
        SendOutcome::Empty => {
            println!("Nothing to send.");
        }
        SendOutcome::Accepted { id, .. } => {
            match id {
                Some(id) => println!("Sent (id {}).", id),
                None => println!("Sent."),
            }
            let messages = thread.map(|t| t.messages).unwrap_or_default();
            println!();
            for message in messages.iter().rev().take(10).rev() {
                println!("  {}", format_message(message));
            }
        }
    }

    Ok(())
}
