//! # chat-core
//!
//! Pure logic for chatsync (no I/O, instant tests).
//!
//! This crate implements the poll-session state machine and the
//! reconciliation rules for a conversation view without any network access
//! or timers, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`PollState`] consumes [`PollEvent`]s and yields [`PollAction`]s
//! - [`ConversationView`] applies fetch results tagged with a [`FetchTicket`]
//! - [`PollPolicy`] computes tick delays
//!
//! The actual I/O (HTTP calls, timer tasks) is performed by `chat-client`,
//! which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compose;
pub mod policy;
pub mod reconcile;
pub mod session;
pub mod view;

pub use compose::{is_sendable, Draft};
pub use policy::{Backoff, PollPolicy, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use reconcile::{FetchTicket, Reconciliation};
pub use session::{PollAction, PollEvent, PollState, SessionId};
pub use view::{ConversationView, LocalIdAllocator, ViewSnapshot};
