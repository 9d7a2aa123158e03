//! Compose rules for outgoing messages.

/// Whether `text` may be sent: anything but empty or whitespace-only.
///
/// The text itself is sent as typed; trimming is only used for this check.
pub fn is_sendable(text: &str) -> bool {
    !text.trim().is_empty()
}

/// The compose input of a conversation view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    text: String,
}

impl Draft {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft text.
    pub fn set(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the draft holds no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clear the draft.
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Take the text for sending and clear the draft.
    ///
    /// Returns `None` and leaves the draft untouched if it is not sendable.
    pub fn take_sendable(&mut self) -> Option<String> {
        is_sendable(&self.text).then(|| std::mem::take(&mut self.text))
    }
}
