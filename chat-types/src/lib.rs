//! # chat-types
//!
//! Foundational types for the chatsync messaging client.
//!
//! This crate provides the types shared by every chatsync crate:
//! - [`ConversationId`], [`UserId`], [`MessageId`] - Identity types
//! - [`Message`], [`Origin`], [`DeliveryStatus`] - The displayed message model
//! - [`MessageRecord`], [`MessagesResponse`], [`SendRequest`], [`SendResponse`] -
//!   JSON records exchanged with the remote message store
//! - [`FetchError`], [`SendError`] - Store error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod message;
mod wire;

pub use error::{FetchError, SendError};
pub use ids::{ConversationId, MessageId, UserId};
pub use message::{DeliveryStatus, Message, Origin};
pub use wire::{
    ChatsResponse, ConversationSummary, InitReport, InitRequest, InitResponse, MessageRecord,
    MessagesResponse, SendAck, SendRequest, SendResponse,
};
