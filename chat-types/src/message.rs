//! The displayed message model.

use serde::{Deserialize, Serialize};

use crate::MessageId;

/// Who authored a message, from the perspective of the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Sent by the local user.
    Mine,
    /// Sent by the peer (or another group member).
    Other,
}

impl Origin {
    /// Map the store's `is_mine` flag.
    pub fn from_is_mine(is_mine: bool) -> Self {
        if is_mine {
            Self::Mine
        } else {
            Self::Other
        }
    }
}

/// Delivery status label shown next to a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Written locally, not yet confirmed by the store.
    Sent,
    /// Accepted by the store.
    Delivered,
    /// Seen by the recipient. Default for loaded history.
    #[default]
    Read,
}

/// A single message in a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned (positive) or locally-assigned (negative) id.
    pub id: MessageId,
    /// Message body.
    pub text: String,
    /// Whether the local user wrote it.
    pub origin: Origin,
    /// Pre-formatted display time (e.g. `14:23`).
    pub time: String,
    /// Delivery status label.
    pub status: DeliveryStatus,
    /// Sender display name, when the store provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl Message {
    /// Whether this is an optimistic entry awaiting confirmation.
    pub fn is_optimistic(&self) -> bool {
        self.id.is_local()
    }

    /// Whether the local user wrote this message.
    pub fn is_mine(&self) -> bool {
        self.origin == Origin::Mine
    }
}
