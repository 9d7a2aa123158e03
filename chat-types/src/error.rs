//! Error types for the remote message store.

use thiserror::Error;

/// Errors from a read against the message store.
///
/// A failed read never mutates view state; the poller retries on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with a non-success status code.
    #[error("store returned status {0}")]
    Status(u16),

    /// The body was not valid JSON for the expected shape.
    #[error("malformed response: {0}")]
    Parse(String),

    /// The response had no `messages` field.
    #[error("response is missing the messages field")]
    MissingMessages,

    /// A record violated the message model (e.g. non-positive id).
    #[error("invalid message record: {0}")]
    InvalidRecord(String),
}

/// Errors from a write against the message store.
///
/// A well-formed response with `success = false` is not a `SendError`; it
/// surfaces as a rejected [`SendAck`](crate::SendAck).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with a non-success status code.
    #[error("store returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error text from the body, if any.
        message: String,
    },

    /// The body was not valid JSON for the expected shape.
    #[error("malformed response: {0}")]
    Parse(String),
}
