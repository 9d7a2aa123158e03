//! Reconciliation of fetched message lists into the conversation view.
//!
//! The store is authoritative for persisted messages, so reconciliation is
//! full replacement: the fetched sequence becomes the displayed sequence,
//! in the order the store returned it. Optimistic entries are not merged by
//! id; they simply disappear once a fetch that follows the write lands.
//!
//! Every fetch is issued with a [`FetchTicket`] captured at issue time. A
//! result is only applied if its ticket still matches the view, which keeps
//! a slow response for a previous conversation (or a previous activation of
//! the same conversation) from clobbering the current one.

use chat_types::{ConversationId, Message};

use crate::{ConversationView, SessionId};

/// Identifies the view a fetch was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    /// Conversation the fetch reads.
    pub conversation: ConversationId,
    /// Activation the fetch belongs to.
    pub session: SessionId,
}

/// What applying a fetch result did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The fetched sequence replaced the displayed one.
    Replaced {
        /// Whether the displayed sequence actually differs from before.
        changed: bool,
    },
    /// The fetch failed; the last good sequence was kept.
    Retained,
    /// The ticket belongs to a superseded view; nothing was touched.
    Discarded,
}

impl Reconciliation {
    /// Whether the view may have changed and should be republished.
    pub fn touched_view(&self) -> bool {
        !matches!(self, Self::Discarded)
    }
}

impl ConversationView {
    /// Whether a result issued with `ticket` may be applied to this view.
    pub fn accepts(&self, ticket: &FetchTicket) -> bool {
        self.conversation == ticket.conversation && self.session == ticket.session
    }

    /// The ticket for a fetch issued against this view right now.
    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            conversation: self.conversation,
            session: self.session,
        }
    }

    /// Apply a successful fetch by full replacement.
    pub fn reconcile(&mut self, ticket: &FetchTicket, fetched: Vec<Message>) -> Reconciliation {
        if !self.accepts(ticket) {
            return Reconciliation::Discarded;
        }

        let changed = self.messages != fetched;
        self.messages = fetched;
        self.loading = false;
        Reconciliation::Replaced { changed }
    }

    /// Record a failed fetch: keep the last good sequence, stop the spinner.
    pub fn fetch_failed(&mut self, ticket: &FetchTicket) -> Reconciliation {
        if !self.accepts(ticket) {
            return Reconciliation::Discarded;
        }

        self.loading = false;
        Reconciliation::Retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_types::{DeliveryStatus, MessageId, Origin};

    fn msg(id: i64, text: &str) -> Message {
        Message {
            id: MessageId::new(id),
            text: text.into(),
            origin: Origin::Other,
            time: "12:00".into(),
            status: DeliveryStatus::Read,
            sender: None,
        }
    }

    fn view() -> ConversationView {
        ConversationView::new(ConversationId::new(1), SessionId::new(1))
    }

    #[test]
    fn fetched_sequence_replaces_view() {
        let mut view = view();
        let ticket = view.ticket();

        let outcome = view.reconcile(&ticket, vec![msg(1, "hi"), msg(2, "there")]);

        assert_eq!(outcome, Reconciliation::Replaced { changed: true });
        assert_eq!(view.messages(), &[msg(1, "hi"), msg(2, "there")]);
        assert!(!view.is_loading());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut view = view();
        let ticket = view.ticket();
        let fetched = vec![msg(1, "hi"), msg(2, "there")];

        view.reconcile(&ticket, fetched.clone());
        let first = view.snapshot();
        let outcome = view.reconcile(&ticket, fetched);

        assert_eq!(outcome, Reconciliation::Replaced { changed: false });
        assert_eq!(view.snapshot(), first);
    }

    #[test]
    fn store_order_is_preserved() {
        let mut view = view();
        let ticket = view.ticket();
        // Ids deliberately out of numeric order.
        let fetched = vec![msg(9, "c"), msg(2, "a"), msg(5, "b")];

        view.reconcile(&ticket, fetched.clone());

        assert_eq!(view.messages(), fetched.as_slice());
    }

    #[test]
    fn empty_fetch_empties_view() {
        let mut view = view();
        let ticket = view.ticket();
        view.reconcile(&ticket, vec![msg(1, "hi")]);

        let outcome = view.reconcile(&ticket, vec![]);

        assert_eq!(outcome, Reconciliation::Replaced { changed: true });
        assert!(view.messages().is_empty());
    }

    #[test]
    fn empty_first_fetch_clears_loading() {
        let mut view = view();
        assert!(view.is_loading());
        let ticket = view.ticket();

        view.reconcile(&ticket, vec![]);

        assert!(view.messages().is_empty());
        assert!(!view.is_loading());
    }

    #[test]
    fn failure_retains_last_good_state() {
        let mut view = view();
        let ticket = view.ticket();
        view.reconcile(&ticket, vec![msg(1, "hi")]);

        let outcome = view.fetch_failed(&ticket);

        assert_eq!(outcome, Reconciliation::Retained);
        assert_eq!(view.messages(), &[msg(1, "hi")]);
    }

    #[test]
    fn first_failure_clears_loading() {
        let mut view = view();
        let ticket = view.ticket();

        view.fetch_failed(&ticket);

        assert!(!view.is_loading());
        assert!(view.messages().is_empty());
    }

    #[test]
    fn stale_conversation_is_discarded() {
        let mut view = view();
        let current = view.ticket();
        view.reconcile(&current, vec![msg(1, "hi")]);

        let stale = FetchTicket {
            conversation: ConversationId::new(99),
            session: SessionId::new(1),
        };
        let outcome = view.reconcile(&stale, vec![msg(50, "wrong thread")]);

        assert_eq!(outcome, Reconciliation::Discarded);
        assert_eq!(view.messages(), &[msg(1, "hi")]);
    }

    #[test]
    fn stale_session_of_same_conversation_is_discarded() {
        let mut view = ConversationView::new(ConversationId::new(1), SessionId::new(4));
        let stale = FetchTicket {
            conversation: ConversationId::new(1),
            session: SessionId::new(3),
        };

        assert_eq!(
            view.reconcile(&stale, vec![msg(1, "old")]),
            Reconciliation::Discarded
        );
        assert_eq!(view.fetch_failed(&stale), Reconciliation::Discarded);
        assert!(view.is_loading(), "stale results must not resolve loading");
    }

    #[test]
    fn optimistic_entry_is_superseded_by_fetch() {
        let mut view = view();
        let ticket = view.ticket();
        view.reconcile(&ticket, vec![msg(1, "hi")]);
        view.insert_optimistic("hello");

        view.reconcile(&ticket, vec![msg(1, "hi"), msg(2, "hello")]);

        assert_eq!(view.messages().len(), 2);
        assert!(view.messages().iter().all(|m| !m.is_optimistic()));
    }

    #[test]
    fn discarded_does_not_touch_view() {
        assert!(!Reconciliation::Discarded.touched_view());
        assert!(Reconciliation::Retained.touched_view());
        assert!(Reconciliation::Replaced { changed: false }.touched_view());
    }
}
