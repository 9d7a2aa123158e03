//! Seed starter conversations.

use anyhow::{Context, Result};
use chat_client::{ChatClient, ClientConfig, MessageStore, MockStore};
use chat_types::{InitReport, UserId};

use super::http_store;

/// Run the init command.
pub async fn run(config: &ClientConfig, use_mock: bool) -> Result<()> {
    if use_mock {
        // Start empty so seeding is visible.
        let client = ChatClient::new(config.chat_config(), MockStore::new());
        do_init(client).await
    } else {
        let client = ChatClient::new(config.chat_config(), http_store(config)?);
        do_init(client).await
    }
}

async fn do_init<S: MessageStore + 'static>(client: ChatClient<S>) -> Result<()> {
    let report = client
        .init_conversations()
        .await
        .context("Failed to initialize conversations")?;
    println!("{}", describe(&report, client.config().user));
    Ok(())
}

fn describe(report: &InitReport, user: UserId) -> String {
    match report {
        InitReport::Created { chats } => {
            format!("Created {} conversation(s) for user {}.", chats, user)
        }
        InitReport::AlreadyInitialized { chats } => {
            format!("User {} already has {} conversation(s).", user, chats)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_with_mock_store() {
        let config = ClientConfig::default();
        assert!(run(&config, true).await.is_ok());
    }

    #[tokio::test]
    async fn init_requires_endpoint() {
        // No init_url configured.
        let config = ClientConfig::default();
        let result = run(&config, false).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to initialize"), "got: {}", err);
    }

    #[test]
    fn describes_both_outcomes() {
        let user = UserId::new(3);
        assert_eq!(
            describe(&InitReport::Created { chats: 4 }, user),
            "Created 4 conversation(s) for user 3."
        );
        assert_eq!(
            describe(&InitReport::AlreadyInitialized { chats: 2 }, user),
            "User 3 already has 2 conversation(s)."
        );
    }
}
