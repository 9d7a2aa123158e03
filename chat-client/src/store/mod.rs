//! Message store abstraction for chatsync.
//!
//! This module provides a pluggable store layer that abstracts the remote
//! message service (HTTP, mock for testing).
//!
//! # Design
//!
//! The store trait is async and stateless from the caller's point of view:
//! - `fetch_messages()` reads a conversation's history
//! - `send_message()` writes one message
//! - `list_conversations()` reads the chat list
//! - `init_conversations()` seeds initial chats for a new user
//!
//! Implementations perform network I/O only. They never touch view state;
//! that is the job of the reconciliation engine in chat-core.
//!
//! # Example
//!
//! ```ignore
//! let store = MockStore::new();
//! store.push_message(ConversationId::new(1), UserId::new(2), "hi");
//! let messages = store.fetch_messages(ConversationId::new(1), UserId::new(1)).await?;
//! ```

mod http;
mod mock;

pub use http::{HttpStore, HttpStoreError};
pub use mock::MockStore;

use async_trait::async_trait;
use chat_types::{
    ConversationId, ConversationSummary, FetchError, InitReport, Message, SendAck, SendError,
    UserId,
};

/// Remote message store for a messaging client.
///
/// Implementations handle the underlying transport (HTTP, mock, etc).
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Read a conversation's messages in store order.
    ///
    /// `user` decides the `mine`/`other` origin of each message.
    async fn fetch_messages(
        &self,
        conversation: ConversationId,
        user: UserId,
    ) -> Result<Vec<Message>, FetchError>;

    /// Write a message.
    ///
    /// The caller guarantees `text` is not blank. A well-formed response
    /// with `accepted = false` is returned as `Ok`.
    async fn send_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
    ) -> Result<SendAck, SendError>;

    /// Read the chat list for `user`, most recent activity first.
    async fn list_conversations(&self, user: UserId)
        -> Result<Vec<ConversationSummary>, FetchError>;

    /// Seed initial chats for `user`. Idempotent.
    async fn init_conversations(&self, user: UserId) -> Result<InitReport, SendError>;
}
