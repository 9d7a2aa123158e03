//! ChatClient - the main interface for chatsync.
//!
//! This module provides [`ChatClient`], the API a presentation layer uses to
//! show one conversation at a time and keep it synchronized with the store.
//!
//! # Architecture
//!
//! ChatClient uses a pure state machine (from chat-core) for the poll
//! lifecycle and interprets its actions to perform actual I/O via the
//! [`MessageStore`] trait.
//!
//! ```text
//! Presentation → ChatClient → MessageStore → Network
//!                    ↓
//!               chat-core (poll state machine, reconciliation)
//! ```
//!
//! Every state change is published as a [`ViewSnapshot`] on a watch channel.
//! The state lock is never held across a store call.
//!
//! # Example
//!
//! ```ignore
//! use chat_client::{ChatClient, ChatConfig, MockStore};
//!
//! let store = MockStore::seeded(UserId::new(1));
//! let client = ChatClient::new(ChatConfig::new(UserId::new(1)), store);
//!
//! client.activate(ConversationId::new(1)).await;
//! client.send_message("hello").await?;
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex, Notify};

use chat_core::{
    is_sendable, ConversationView, FetchTicket, PollAction, PollEvent, PollPolicy, PollState,
    Reconciliation, SessionId, ViewSnapshot,
};
use chat_types::{
    ConversationId, ConversationSummary, FetchError, InitReport, MessageId, SendError, UserId,
};

use crate::scheduler::{PollSession, TickOutcome};
use crate::store::MessageStore;

/// Send pipeline errors.
///
/// Every failure is reported to the caller; none is swallowed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The write could not be performed.
    #[error("send failed: {0}")]
    Send(#[from] SendError),

    /// The store answered but did not accept the message.
    #[error("message rejected by store")]
    Rejected,

    /// There is no active conversation to send into.
    #[error("no active conversation")]
    NoActiveConversation,
}

/// Result of a send that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The text was blank; nothing was sent.
    Empty,
    /// The store accepted the message and a refresh was applied.
    Accepted {
        /// Id the store assigned, when it reported one.
        id: Option<MessageId>,
        /// What the follow-up refresh did to the view.
        reconciliation: Reconciliation,
    },
}

/// Configuration for ChatClient.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The local user.
    pub user: UserId,
    /// Tick timing for the active conversation.
    pub poll: PollPolicy,
}

impl ChatConfig {
    /// Create a configuration for `user` with the default 3s fixed poll.
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            poll: PollPolicy::default(),
        }
    }

    /// Set the poll period.
    pub fn with_poll_interval(mut self, period: Duration) -> Self {
        let backoff = self.poll.backoff();
        self.poll = PollPolicy::fixed(period);
        if let Some(backoff) = backoff {
            self.poll = self.poll.with_backoff(backoff.max_delay);
        }
        self
    }

    /// Back off after failed ticks, up to `max_delay` between ticks.
    pub fn with_backoff(mut self, max_delay: Duration) -> Self {
        self.poll = self.poll.with_backoff(max_delay);
        self
    }
}

/// What executing a batch of actions asks the caller to do next.
enum Step {
    Fetch(FetchTicket),
    Wait,
    Idle,
}

struct Inner {
    poll: PollState,
    view: Option<ConversationView>,
    timer: PollSession,
    last_session: SessionId,
    typing_epoch: u64,
}

impl Inner {
    fn apply(&mut self, event: PollEvent) -> Vec<PollAction> {
        let (state, actions) = std::mem::take(&mut self.poll).on_event(event);
        self.poll = state;
        actions
    }
}

struct Shared<S> {
    store: S,
    config: ChatConfig,
    state: Mutex<Inner>,
    settled: Notify,
    updates: watch::Sender<Option<ViewSnapshot>>,
}

/// The main chat client.
///
/// Cheap to clone; clones drive the same conversation view.
pub struct ChatClient<S: MessageStore + 'static> {
    shared: Arc<Shared<S>>,
}

impl<S: MessageStore + 'static> Clone for ChatClient<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: MessageStore + 'static> ChatClient<S> {
    /// Create a new ChatClient. Nothing is polled until a conversation is activated.
    pub fn new(config: ChatConfig, store: S) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                store,
                config,
                state: Mutex::new(Inner {
                    poll: PollState::new(),
                    view: None,
                    timer: PollSession::new(),
                    last_session: SessionId::new(0),
                    typing_epoch: 0,
                }),
                settled: Notify::new(),
                updates,
            }),
        }
    }

    /// The store this client talks to.
    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// The client configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.shared.config
    }

    /// Subscribe to view updates. `None` means no conversation is shown.
    pub fn subscribe(&self) -> watch::Receiver<Option<ViewSnapshot>> {
        self.shared.updates.subscribe()
    }

    /// The most recently published view.
    pub fn snapshot(&self) -> Option<ViewSnapshot> {
        self.shared.updates.borrow().clone()
    }

    /// The conversation being shown, if any.
    pub async fn active_conversation(&self) -> Option<ConversationId> {
        self.shared.state.lock().await.poll.conversation()
    }

    /// Show `conversation` and start polling it.
    ///
    /// Any previous conversation's timer is stopped first and its in-flight
    /// results are discarded when they land. Re-activating the conversation
    /// already shown changes nothing.
    pub async fn activate(&self, conversation: ConversationId) {
        let shared = &self.shared;
        let mut inner = shared.state.lock().await;
        let session = inner.last_session.next();
        inner.last_session = session;

        let actions = inner.apply(PollEvent::Activate {
            conversation,
            session,
        });
        if actions.is_empty() {
            tracing::debug!("Conversation {} already active", conversation);
            return;
        }
        shared.execute(&mut inner, actions);
        shared.publish(&inner);
    }

    /// Stop polling and drop the view.
    pub async fn deactivate(&self) {
        let shared = &self.shared;
        let mut inner = shared.state.lock().await;
        let actions = inner.apply(PollEvent::Deactivate);
        shared.execute(&mut inner, actions);
        shared.publish(&inner);
    }

    /// Fetch the active conversation now instead of waiting for the next tick.
    ///
    /// Waits for an outstanding fetch to settle first. Returns
    /// [`Reconciliation::Discarded`] if nothing is active or the conversation
    /// changes meanwhile.
    pub async fn refresh(&self) -> Reconciliation {
        let session = self.shared.state.lock().await.poll.session();
        match session {
            Some(session) => self.shared.refresh_for(session).await,
            None => Reconciliation::Discarded,
        }
    }

    /// Replace the compose draft. Returns false if no conversation is active.
    pub async fn set_draft(&self, text: &str) -> bool {
        let shared = &self.shared;
        let mut inner = shared.state.lock().await;
        let Some(view) = inner.view.as_mut() else {
            return false;
        };
        view.draft_mut().set(text);
        shared.publish(&inner);
        true
    }

    /// Send `text` to the active conversation.
    ///
    /// Blank text is a no-op. Otherwise the draft is cleared, an optimistic
    /// entry is shown, the text is written unmodified, and on acceptance the
    /// conversation is refreshed. On failure the optimistic entry is
    /// withdrawn and the error returned.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, PipelineError> {
        if !is_sendable(text) {
            return Ok(SendOutcome::Empty);
        }

        let (ticket, local_id) = {
            let shared = &self.shared;
            let mut inner = shared.state.lock().await;
            let view = inner
                .view
                .as_mut()
                .ok_or(PipelineError::NoActiveConversation)?;
            view.draft_mut().clear();
            let local_id = view.insert_optimistic(text);
            let ticket = view.ticket();
            shared.publish(&inner);
            (ticket, local_id)
        };

        self.shared.deliver(ticket, local_id, text).await
    }

    /// Send the current draft. A blank draft is left as is.
    pub async fn send_draft(&self) -> Result<SendOutcome, PipelineError> {
        let (ticket, local_id, text) = {
            let shared = &self.shared;
            let mut inner = shared.state.lock().await;
            let view = inner
                .view
                .as_mut()
                .ok_or(PipelineError::NoActiveConversation)?;
            let Some(text) = view.draft_mut().take_sendable() else {
                return Ok(SendOutcome::Empty);
            };
            let local_id = view.insert_optimistic(&text);
            let ticket = view.ticket();
            shared.publish(&inner);
            (ticket, local_id, text)
        };

        self.shared.deliver(ticket, local_id, &text).await
    }

    /// Set the peer-typing indicator. Returns false if no conversation is active.
    pub async fn set_peer_typing(&self, typing: bool) -> bool {
        let shared = &self.shared;
        let mut inner = shared.state.lock().await;
        inner.typing_epoch += 1;
        let Some(view) = inner.view.as_mut() else {
            return false;
        };
        view.set_peer_typing(typing);
        shared.publish(&inner);
        true
    }

    /// Show the peer-typing indicator for `duration`.
    ///
    /// The indicator is local only; nothing is sent to the store. A later
    /// call restarts the countdown.
    pub async fn simulate_peer_typing(&self, duration: Duration) -> bool {
        let shared = &self.shared;
        let (ticket, epoch) = {
            let mut inner = shared.state.lock().await;
            inner.typing_epoch += 1;
            let epoch = inner.typing_epoch;
            let Some(view) = inner.view.as_mut() else {
                return false;
            };
            view.set_peer_typing(true);
            let ticket = view.ticket();
            shared.publish(&inner);
            (ticket, epoch)
        };

        let weak = Arc::downgrade(shared);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(shared) = weak.upgrade() {
                shared.end_typing(ticket, epoch).await;
            }
        });
        true
    }

    /// List the local user's conversations.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, FetchError> {
        self.shared
            .store
            .list_conversations(self.shared.config.user)
            .await
    }

    /// Seed initial conversations for the local user.
    pub async fn init_conversations(&self) -> Result<InitReport, SendError> {
        let report = self
            .shared
            .store
            .init_conversations(self.shared.config.user)
            .await?;
        tracing::info!(
            "Conversations initialized for user {}: {:?}",
            self.shared.config.user,
            report
        );
        Ok(report)
    }
}

impl<S: MessageStore + 'static> Shared<S> {
    /// Publish the current view.
    fn publish(&self, inner: &Inner) {
        self.updates
            .send_replace(inner.view.as_ref().map(ConversationView::snapshot));
    }

    /// Execute actions from the poll state machine.
    fn execute(self: &Arc<Self>, inner: &mut Inner, actions: Vec<PollAction>) -> Step {
        let mut step = Step::Idle;
        for action in actions {
            match action {
                PollAction::StopTimer => inner.timer.stop(),
                PollAction::ResetView {
                    conversation,
                    session,
                } => {
                    inner.view = Some(ConversationView::new(conversation, session));
                    self.settled.notify_waiters();
                }
                PollAction::ClearView => {
                    inner.view = None;
                    self.settled.notify_waiters();
                }
                PollAction::StartTimer {
                    conversation,
                    session,
                } => {
                    let weak: Weak<Self> = Arc::downgrade(self);
                    inner
                        .timer
                        .start(conversation, self.config.poll, move || {
                            let weak = weak.clone();
                            async move {
                                match weak.upgrade() {
                                    Some(shared) => shared.tick(session).await,
                                    None => TickOutcome::Closed,
                                }
                            }
                        });
                }
                PollAction::IssueFetch(ticket) => step = Step::Fetch(ticket),
                PollAction::SkipTick => {
                    tracing::debug!("Tick skipped: fetch already in flight");
                }
                PollAction::AwaitInFlight => step = Step::Wait,
                PollAction::NotifySettled => self.settled.notify_waiters(),
            }
        }
        step
    }

    /// One timer tick for `session`.
    async fn tick(self: Arc<Self>, session: SessionId) -> TickOutcome {
        let ticket = {
            let mut inner = self.state.lock().await;
            if inner.poll.session() != Some(session) {
                return TickOutcome::Closed;
            }
            let actions = inner.apply(PollEvent::Tick);
            match self.execute(&mut inner, actions) {
                Step::Fetch(ticket) => ticket,
                Step::Wait | Step::Idle => return TickOutcome::Skipped,
            }
        };

        match self.fetch_and_reconcile(ticket).await {
            Reconciliation::Replaced { .. } => TickOutcome::Fetched,
            Reconciliation::Retained => TickOutcome::Failed,
            Reconciliation::Discarded => TickOutcome::Closed,
        }
    }

    /// Fetch for `ticket` without holding the lock, then apply the result.
    async fn fetch_and_reconcile(self: Arc<Self>, ticket: FetchTicket) -> Reconciliation {
        let result = self
            .store
            .fetch_messages(ticket.conversation, self.config.user)
            .await;

        let mut inner = self.state.lock().await;
        let reconciliation = match (inner.view.as_mut(), result) {
            (Some(view), Ok(messages)) => view.reconcile(&ticket, messages),
            (Some(view), Err(e)) => {
                let reconciliation = view.fetch_failed(&ticket);
                if reconciliation == Reconciliation::Retained {
                    tracing::warn!(
                        "Fetch failed for conversation {}: {}",
                        ticket.conversation,
                        e
                    );
                }
                reconciliation
            }
            (None, _) => Reconciliation::Discarded,
        };

        if reconciliation == Reconciliation::Discarded {
            tracing::debug!(
                "Discarded stale fetch result for conversation {}",
                ticket.conversation
            );
        }

        let actions = inner.apply(PollEvent::FetchSettled {
            session: ticket.session,
        });
        self.execute(&mut inner, actions);
        if reconciliation.touched_view() {
            self.publish(&inner);
        }
        reconciliation
    }

    /// Forced refresh for `session`, waiting out any fetch already in flight.
    ///
    /// Runs on its own task: while it waits, the next fetch slot is reserved
    /// for it, and a cancelled caller must not leave that reservation behind.
    async fn refresh_for(self: &Arc<Self>, session: SessionId) -> Reconciliation {
        match tokio::spawn(Arc::clone(self).run_refresh(session)).await {
            Ok(reconciliation) => reconciliation,
            Err(e) => {
                tracing::warn!("Refresh task failed: {}", e);
                Reconciliation::Discarded
            }
        }
    }

    async fn run_refresh(self: Arc<Self>, session: SessionId) -> Reconciliation {
        loop {
            let mut inner = self.state.lock().await;
            if inner.poll.session() != Some(session) {
                return Reconciliation::Discarded;
            }

            let actions = inner.apply(PollEvent::RefreshRequested);
            match self.execute(&mut inner, actions) {
                Step::Fetch(ticket) => {
                    drop(inner);
                    return Arc::clone(&self).fetch_and_reconcile(ticket).await;
                }
                Step::Wait => {
                    let settled = self.settled.notified();
                    drop(inner);
                    settled.await;
                }
                Step::Idle => return Reconciliation::Discarded,
            }
        }
    }

    /// Write `text` and finish the send pipeline for the optimistic entry `local_id`.
    async fn deliver(
        self: &Arc<Self>,
        ticket: FetchTicket,
        local_id: MessageId,
        text: &str,
    ) -> Result<SendOutcome, PipelineError> {
        let result = self
            .store
            .send_message(ticket.conversation, self.config.user, text)
            .await;

        match result {
            Ok(ack) if ack.accepted => {
                tracing::debug!(
                    "Message accepted in conversation {} (id: {:?})",
                    ticket.conversation,
                    ack.id
                );
                let reconciliation = self.refresh_for(ticket.session).await;
                Ok(SendOutcome::Accepted {
                    id: ack.id,
                    reconciliation,
                })
            }
            Ok(_) => {
                self.withdraw(ticket, local_id).await;
                tracing::warn!("Message rejected in conversation {}", ticket.conversation);
                Err(PipelineError::Rejected)
            }
            Err(e) => {
                self.withdraw(ticket, local_id).await;
                tracing::warn!(
                    "Send failed in conversation {}: {}",
                    ticket.conversation,
                    e
                );
                Err(PipelineError::Send(e))
            }
        }
    }

    async fn withdraw(&self, ticket: FetchTicket, local_id: MessageId) {
        let mut inner = self.state.lock().await;
        let withdrawn = match inner.view.as_mut() {
            Some(view) if view.accepts(&ticket) => view.withdraw_optimistic(local_id),
            _ => false,
        };
        if withdrawn {
            self.publish(&inner);
        }
    }

    async fn end_typing(&self, ticket: FetchTicket, epoch: u64) {
        let mut inner = self.state.lock().await;
        if inner.typing_epoch != epoch {
            return;
        }
        let ended = match inner.view.as_mut() {
            Some(view) if view.accepts(&ticket) => {
                view.set_peer_typing(false);
                true
            }
            _ => false,
        };
        if ended {
            self.publish(&inner);
        }
    }
}
