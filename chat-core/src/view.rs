//! Conversation view state.
//!
//! One [`ConversationView`] exists per activation. It is replaced wholesale
//! when the active conversation changes, never merged.

use chat_types::{ConversationId, DeliveryStatus, Message, MessageId, Origin};

use crate::{Draft, SessionId};

/// Hands out ids for optimistic entries.
///
/// Ids come from the negative namespace (`-1`, `-2`, ...), so they cannot
/// collide with store-assigned ids.
#[derive(Debug, Clone, Default)]
pub struct LocalIdAllocator {
    issued: u32,
}

impl LocalIdAllocator {
    /// Create an allocator that has issued nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next local id.
    pub fn allocate(&mut self) -> MessageId {
        self.issued = self.issued.saturating_add(1);
        MessageId::local(self.issued)
    }
}

/// State rendered for the active conversation.
#[derive(Debug, Clone)]
pub struct ConversationView {
    pub(crate) conversation: ConversationId,
    pub(crate) session: SessionId,
    pub(crate) messages: Vec<Message>,
    pub(crate) loading: bool,
    pub(crate) peer_typing: bool,
    pub(crate) draft: Draft,
    pub(crate) local_ids: LocalIdAllocator,
}

impl ConversationView {
    /// Create an empty view that is waiting for its first fetch.
    pub fn new(conversation: ConversationId, session: SessionId) -> Self {
        Self {
            conversation,
            session,
            messages: Vec::new(),
            loading: true,
            peer_typing: false,
            draft: Draft::new(),
            local_ids: LocalIdAllocator::new(),
        }
    }

    /// The conversation this view shows.
    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    /// The activation this view belongs to.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True until the first fetch settles.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the peer-typing indicator is shown.
    pub fn is_peer_typing(&self) -> bool {
        self.peer_typing
    }

    /// Show or hide the peer-typing indicator. Local only.
    pub fn set_peer_typing(&mut self, typing: bool) {
        self.peer_typing = typing;
    }

    /// The compose draft.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Mutable access to the compose draft.
    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Append an optimistic entry for text the local user just sent.
    ///
    /// The entry has a local id, status `sent` and no time label. It is
    /// superseded by the next successful fetch.
    pub fn insert_optimistic(&mut self, text: &str) -> MessageId {
        let id = self.local_ids.allocate();
        self.messages.push(Message {
            id,
            text: text.to_string(),
            origin: Origin::Mine,
            time: String::new(),
            status: DeliveryStatus::Sent,
            sender: None,
        });
        id
    }

    /// Remove an optimistic entry whose write failed.
    ///
    /// Returns false if the entry is already gone (a fetch replaced it).
    pub fn withdraw_optimistic(&mut self, id: MessageId) -> bool {
        if !id.is_local() {
            return false;
        }
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Copy the renderable state out for the presentation layer.
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            conversation: self.conversation,
            messages: self.messages.clone(),
            loading: self.loading,
            peer_typing: self.peer_typing,
            draft: self.draft.text().to_string(),
        }
    }
}

/// Everything the presentation layer needs to render a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    /// Conversation shown.
    pub conversation: ConversationId,
    /// Messages in display order.
    pub messages: Vec<Message>,
    /// True until the first fetch settles.
    pub loading: bool,
    /// Peer-typing indicator.
    pub peer_typing: bool,
    /// Current compose draft.
    pub draft: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ConversationView {
        ConversationView::new(ConversationId::new(3), SessionId::new(1))
    }

    #[test]
    fn new_view_is_loading_and_empty() {
        let view = view();
        assert!(view.is_loading());
        assert!(view.messages().is_empty());
        assert!(!view.is_peer_typing());
        assert!(view.draft().is_empty());
    }

    #[test]
    fn allocator_issues_distinct_negative_ids() {
        let mut ids = LocalIdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();

        assert_ne!(a, b);
        assert!(a.is_local() && b.is_local());
    }

    #[test]
    fn optimistic_entry_is_appended_as_mine() {
        let mut view = view();
        let id = view.insert_optimistic("hello");

        let last = view.messages().last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.text, "hello");
        assert_eq!(last.origin, Origin::Mine);
        assert_eq!(last.status, DeliveryStatus::Sent);
        assert!(last.is_optimistic());
    }

    #[test]
    fn optimistic_ids_never_repeat_within_a_view() {
        let mut view = view();
        let first = view.insert_optimistic("one");
        view.withdraw_optimistic(first);
        let second = view.insert_optimistic("two");

        assert_ne!(first, second);
    }

    #[test]
    fn withdraw_removes_only_that_entry() {
        let mut view = view();
        let keep = view.insert_optimistic("keep");
        let discard = view.insert_optimistic("discard");

        assert!(view.withdraw_optimistic(discard));
        assert!(!view.withdraw_optimistic(discard));
        assert_eq!(view.messages().len(), 1);
        assert_eq!(view.messages()[0].id, keep);
    }

    #[test]
    fn withdraw_ignores_server_ids() {
        let mut view = view();
        assert!(!view.withdraw_optimistic(MessageId::new(5)));
    }

    #[test]
    fn typing_flag_is_local_state() {
        let mut view = view();
        view.set_peer_typing(true);
        assert!(view.snapshot().peer_typing);
        view.set_peer_typing(false);
        assert!(!view.snapshot().peer_typing);
    }

    #[test]
    fn snapshot_carries_draft() {
        let mut view = view();
        view.draft_mut().set("typing...");
        let snapshot = view.snapshot();

        assert_eq!(snapshot.conversation, ConversationId::new(3));
        assert_eq!(snapshot.draft, "typing...");
        assert!(snapshot.loading);
    }
}
