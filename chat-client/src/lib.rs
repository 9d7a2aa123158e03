//! # chat-client
//!
//! Polling client for the chatsync messaging core.
//!
//! This is the library a presentation layer drives to show one conversation
//! at a time and keep it synchronized with the remote message store.
//!
//! ## Features
//!
//! - **Store Abstraction**: Pluggable message store (HTTP, mock)
//! - **Owned Poll Sessions**: One timer task per active conversation, torn
//!   down before the next one starts
//! - **Send Pipeline**: Optimistic insert, remote write, forced reconcile,
//!   tagged failures
//! - **Pure State Machine**: Uses chat-core for side-effect-free logic
//! - **TOML Configuration**: Store endpoint, poll timing and local user
//!
//! ## Example
//!
//! ```ignore
//! use chat_client::{ChatClient, ChatConfig, HttpStore};
//!
//! let store = HttpStore::new("https://store.example/messages", None, Duration::from_secs(10))?;
//! let client = ChatClient::new(ChatConfig::new(UserId::new(1)), store);
//!
//! let mut updates = client.subscribe();
//! client.activate(ConversationId::new(4)).await;
//! client.send_message("hello").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod scheduler;
pub mod store;

pub use client::{ChatClient, ChatConfig, PipelineError, SendOutcome};
pub use config::{ClientConfig, ConfigError};
pub use scheduler::{PollSession, TickOutcome};
pub use store::{HttpStore, HttpStoreError, MessageStore, MockStore};

pub use chat_core::{PollPolicy, Reconciliation, ViewSnapshot};
