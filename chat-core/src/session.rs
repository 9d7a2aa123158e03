//! Poll session state machine for chatsync.
//!
//! This module provides a pure, side-effect-free state machine for the poll
//! lifecycle of the active conversation. The state machine takes events as
//! input and produces a new state plus a list of actions to execute.
//!
//! The actual I/O (spawning the timer task, calling the store) is performed
//! by chat-client, not by this module.
//!
//! At most one session runs at a time. Each activation gets a fresh
//! [`SessionId`]; fetch tickets carry it so results from a superseded session
//! can be told apart even when the same conversation is re-opened.

use std::fmt;

use chat_types::ConversationId;

use crate::FetchTicket;

/// Identifies one activation of a conversation.
///
/// Allocated by the caller, monotonically increasing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a SessionId from a raw counter value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

/// Poll lifecycle state - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// No conversation is active.
    Stopped,
    /// A conversation is active and being polled.
    Running {
        /// The active conversation.
        conversation: ConversationId,
        /// The current activation.
        session: SessionId,
        /// Whether a fetch for this session has been issued and not yet settled.
        in_flight: bool,
        /// Whether a forced refresh is waiting for the fetch slot. Ticks yield
        /// to it until it has issued its fetch.
        refresh_waiting: bool,
    },
}

impl PollState {
    /// Create a new state machine in the Stopped state.
    pub fn new() -> Self {
        Self::Stopped
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (chat-client)
    /// is responsible for executing the returned actions in order.
    pub fn on_event(self, event: PollEvent) -> (Self, Vec<PollAction>) {
        match (self, event) {
            // Activation
            (Self::Stopped, PollEvent::Activate {
                conversation,
                session,
            }) => (
                Self::Running {
                    conversation,
                    session,
                    in_flight: false,
                    refresh_waiting: false,
                },
                vec![
                    PollAction::ResetView {
                        conversation,
                        session,
                    },
                    PollAction::StartTimer {
                        conversation,
                        session,
                    },
                ],
            ),
            (
                state @ Self::Running {
                    conversation: current,
                    ..
                },
                PollEvent::Activate { conversation, .. },
            ) if current == conversation => (state, vec![]),
            (Self::Running { .. }, PollEvent::Activate {
                conversation,
                session,
            }) => (
                Self::Running {
                    conversation,
                    session,
                    in_flight: false,
                    refresh_waiting: false,
                },
                vec![
                    PollAction::StopTimer,
                    PollAction::ResetView {
                        conversation,
                        session,
                    },
                    PollAction::StartTimer {
                        conversation,
                        session,
                    },
                ],
            ),

            // Deactivation
            (Self::Running { .. }, PollEvent::Deactivate) => (
                Self::Stopped,
                vec![PollAction::StopTimer, PollAction::ClearView],
            ),

            // Fetch triggers
            (
                Self::Running {
                    conversation,
                    session,
                    in_flight: false,
                    ..
                },
                PollEvent::RefreshRequested,
            )
            | (
                Self::Running {
                    conversation,
                    session,
                    in_flight: false,
                    refresh_waiting: false,
                },
                PollEvent::Tick,
            ) => (
                Self::Running {
                    conversation,
                    session,
                    in_flight: true,
                    refresh_waiting: false,
                },
                vec![PollAction::IssueFetch(FetchTicket {
                    conversation,
                    session,
                })],
            ),
            (
                Self::Running {
                    conversation,
                    session,
                    in_flight: true,
                    ..
                },
                PollEvent::RefreshRequested,
            ) => (
                Self::Running {
                    conversation,
                    session,
                    in_flight: true,
                    refresh_waiting: true,
                },
                vec![PollAction::AwaitInFlight],
            ),
            // In flight, or the slot is reserved for a waiting refresh.
            (state @ Self::Running { .. }, PollEvent::Tick) => {
                (state, vec![PollAction::SkipTick])
            }

            // Settlement
            (
                Self::Running {
                    conversation,
                    session,
                    in_flight: true,
                    refresh_waiting,
                },
                PollEvent::FetchSettled { session: settled },
            ) if settled == session => (
                Self::Running {
                    conversation,
                    session,
                    in_flight: false,
                    refresh_waiting,
                },
                vec![PollAction::NotifySettled],
            ),

            // Stale settlements, events while stopped - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a conversation is active.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Check if a fetch is outstanding for the active session.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Running { in_flight: true, .. })
    }

    /// The active conversation, if any.
    pub fn conversation(&self) -> Option<ConversationId> {
        match self {
            Self::Running { conversation, .. } => Some(*conversation),
            Self::Stopped => None,
        }
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Self::Running { session, .. } => Some(*session),
            Self::Stopped => None,
        }
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that drive the poll lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The presentation layer opened a conversation.
    Activate {
        /// Conversation to poll.
        conversation: ConversationId,
        /// Fresh session id for this activation.
        session: SessionId,
    },
    /// The presentation layer closed the conversation view.
    Deactivate,
    /// The periodic timer fired.
    Tick,
    /// An immediate refresh was requested (after a successful send).
    RefreshRequested,
    /// A fetch issued for `session` completed, successfully or not.
    FetchSettled {
        /// Session the fetch was issued for.
        session: SessionId,
    },
}

/// Actions to be executed by chat-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollAction {
    /// Cancel the running timer task.
    StopTimer,
    /// Replace the view with a fresh, loading view for this session.
    ResetView {
        /// Newly active conversation.
        conversation: ConversationId,
        /// Newly active session.
        session: SessionId,
    },
    /// Drop the view.
    ClearView,
    /// Start the timer task. Its first tick fires immediately.
    StartTimer {
        /// Conversation the timer polls.
        conversation: ConversationId,
        /// Session the timer belongs to.
        session: SessionId,
    },
    /// Fetch messages and reconcile with this ticket.
    IssueFetch(FetchTicket),
    /// A tick arrived while a fetch was outstanding or reserved; do nothing.
    SkipTick,
    /// A forced refresh arrived while a fetch was outstanding; wait for it to
    /// settle, then request again. The next fetch slot is held for it.
    AwaitInFlight,
    /// Wake anyone waiting on [`PollAction::AwaitInFlight`].
    NotifySettled,
}
