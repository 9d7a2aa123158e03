//! Identity types for chatsync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a conversation (a thread between the local user and a peer or group).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(i64);

impl ConversationId {
    /// Create a ConversationId from its raw value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConversationId({})", self.0)
    }
}

/// Identifier of a user of the message store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a UserId from its raw value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// Identifier of a message.
///
/// The id space is split by sign: the store assigns positive ids, while
/// optimistic entries inserted before confirmation get negative ids. The two
/// namespaces never collide, so an optimistic entry can never shadow a
/// persisted message with the same rendering key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Create a MessageId from a raw value as received from the store.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Create a store-assigned id. Returns `None` for values outside the
    /// store namespace (zero or negative).
    pub fn server(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Create a locally-assigned id from a 1-based sequence number.
    ///
    /// Sequence `n` maps to id `-n`.
    pub fn local(sequence: u32) -> Self {
        Self(-i64::from(sequence.max(1)))
    }

    /// Get the raw value.
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Whether this id was assigned locally (optimistic entry).
    pub const fn is_local(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "MessageId(local {})", -self.0)
        } else {
            write!(f, "MessageId({})", self.0)
        }
    }
}
