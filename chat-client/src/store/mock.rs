//! Mock message store for testing.
//!
//! Keeps conversations in memory, allows injecting failures and per-conversation
//! response delays, and records every request for verification.

use super::MessageStore;
use async_trait::async_trait;
use chat_types::{
    ConversationId, ConversationSummary, DeliveryStatus, FetchError, InitReport, Message,
    MessageId, Origin, SendAck, SendError, SendRequest, UserId,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Peers and opening lines used when seeding chats for a new user.
const SEED_CHATS: [(i64, &str); 4] = [
    (2, "Hi! How are you?"),
    (3, "Meeting at 20:00"),
    (4, "Sent the files"),
    (5, "Great! Let's meet up"),
];

/// Mock message store for testing.
///
/// Allows seeding conversations, injecting failures, and inspecting requests.
/// Clones share state, so a test can keep a handle while the client owns another.
#[derive(Debug, Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: MessageId,
    sender: UserId,
    text: String,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    conversations: BTreeMap<ConversationId, Vec<StoredMessage>>,
    next_id: i64,
    seeded_users: HashSet<UserId>,
    fetch_delays: HashMap<ConversationId, Duration>,
    send_delay: Option<Duration>,
    fetch_log: Vec<ConversationId>,
    sent: Vec<SendRequest>,
    fetches_in_flight: usize,
    max_fetches_in_flight: usize,
    unreachable: bool,
    fail_next_fetch: Option<String>,
    fail_next_send: Option<String>,
    reject_next_send: bool,
}

impl MockStoreInner {
    fn append(&mut self, conversation: ConversationId, sender: UserId, text: &str) -> MessageId {
        self.next_id += 1;
        let id = MessageId::new(self.next_id);
        self.conversations
            .entry(conversation)
            .or_default()
            .push(StoredMessage {
                id,
                sender,
                text: text.to_string(),
            });
        id
    }
}

/// Display time derived from the id, so labels are stable across fetches.
fn time_label(id: MessageId) -> String {
    let minutes = id.value().rem_euclid(24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn render(stored: &StoredMessage, user: UserId) -> Message {
    Message {
        id: stored.id,
        text: stored.text.clone(),
        origin: Origin::from_is_mine(stored.sender == user),
        time: time_label(stored.id),
        status: DeliveryStatus::Read,
        sender: Some(format!("user{}", stored.sender)),
    }
}

/// Decrements the in-flight counter even if the fetch future is dropped.
struct InFlight {
    inner: Arc<Mutex<MockStoreInner>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fetches_in_flight = inner.fetches_in_flight.saturating_sub(1);
        }
    }
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store with the demo chats seeded for `user`.
    pub fn seeded(user: UserId) -> Self {
        let store = Self::new();
        store.seed(user);
        store
    }

    /// Seed the demo chats for `user` if they have none. Returns the report
    /// the seeding endpoint would give.
    pub fn seed(&self, user: UserId) -> InitReport {
        let mut inner = self.inner.lock().unwrap();
        if !inner.seeded_users.insert(user) {
            return InitReport::AlreadyInitialized {
                chats: SEED_CHATS.len() as u32,
            };
        }

        let base = inner
            .conversations
            .keys()
            .last()
            .map(|c| c.value())
            .unwrap_or(0);
        for (offset, (peer, text)) in SEED_CHATS.iter().enumerate() {
            let conversation = ConversationId::new(base + offset as i64 + 1);
            inner.append(conversation, UserId::new(*peer), text);
        }
        InitReport::Created {
            chats: SEED_CHATS.len() as u32,
        }
    }

    /// Add a message to a conversation as if `sender` had written it elsewhere.
    pub fn push_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
    ) -> MessageId {
        let mut inner = self.inner.lock().unwrap();
        inner.append(conversation, sender, text)
    }

    /// Make every fetch of `conversation` take `delay` before answering.
    ///
    /// The answer reflects the store as it was when the fetch was issued.
    pub fn set_fetch_delay(&self, conversation: ConversationId, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.fetch_delays.insert(conversation, delay);
    }

    /// Remove a delay set with [`set_fetch_delay`](Self::set_fetch_delay).
    pub fn clear_fetch_delay(&self, conversation: ConversationId) {
        let mut inner = self.inner.lock().unwrap();
        inner.fetch_delays.remove(&conversation);
    }

    /// Make every send take `delay` before it reaches the store.
    pub fn set_send_delay(&self, delay: Option<Duration>) {
        let mut inner = self.inner.lock().unwrap();
        inner.send_delay = delay;
    }

    /// Make every call fail with a transport error until turned off.
    pub fn set_unreachable(&self, unreachable: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.unreachable = unreachable;
    }

    /// Cause the next fetch to fail with the given error.
    pub fn fail_next_fetch(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_fetch = Some(error.to_string());
    }

    /// Cause the next send to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Cause the next send to be answered with `success = false`.
    pub fn reject_next_send(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.reject_next_send = true;
    }

    /// Conversations fetched, in request order.
    pub fn fetch_log(&self) -> Vec<ConversationId> {
        let inner = self.inner.lock().unwrap();
        inner.fetch_log.clone()
    }

    /// Number of fetches issued for `conversation`.
    pub fn fetch_count(&self, conversation: ConversationId) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .fetch_log
            .iter()
            .filter(|c| **c == conversation)
            .count()
    }

    /// Highest number of fetches that were outstanding at the same time.
    pub fn max_concurrent_fetches(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.max_fetches_in_flight
    }

    /// Every write request received, accepted or not.
    pub fn sent_messages(&self) -> Vec<SendRequest> {
        let inner = self.inner.lock().unwrap();
        inner.sent.clone()
    }

    /// Clear all state (conversations, failures, logs).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockStoreInner::default();
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl MessageStore for MockStore {
    async fn fetch_messages(
        &self,
        conversation: ConversationId,
        user: UserId,
    ) -> Result<Vec<Message>, FetchError> {
        let (delay, result, guard) = {
            let mut inner = self.inner.lock().unwrap();
            inner.fetch_log.push(conversation);

            if inner.unreachable {
                return Err(FetchError::Transport("store unreachable".into()));
            }
            // Check for forced failure
            if let Some(error) = inner.fail_next_fetch.take() {
                return Err(FetchError::Transport(error));
            }

            inner.fetches_in_flight += 1;
            inner.max_fetches_in_flight = inner.max_fetches_in_flight.max(inner.fetches_in_flight);

            let messages = inner
                .conversations
                .get(&conversation)
                .map(|stored| stored.iter().map(|m| render(m, user)).collect())
                .unwrap_or_default();
            let delay = inner.fetch_delays.get(&conversation).copied();
            let guard = InFlight {
                inner: Arc::clone(&self.inner),
            };
            (delay, messages, guard)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        drop(guard);
        Ok(result)
    }

    async fn send_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
    ) -> Result<SendAck, SendError> {
        let delay = self.inner.lock().unwrap().send_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.sent.push(SendRequest {
            chat_id: conversation,
            sender_id: sender,
            text: text.to_string(),
        });

        if inner.unreachable {
            return Err(SendError::Transport("store unreachable".into()));
        }
        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(SendError::Transport(error));
        }
        if std::mem::take(&mut inner.reject_next_send) {
            return Ok(SendAck::rejected());
        }

        let id = inner.append(conversation, sender, text);
        Ok(SendAck {
            accepted: true,
            id: Some(id),
            time: Some(time_label(id)),
        })
    }

    async fn list_conversations(
        &self,
        user: UserId,
    ) -> Result<Vec<ConversationSummary>, FetchError> {
        let inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(FetchError::Transport("store unreachable".into()));
        }

        let mut chats: Vec<ConversationSummary> = inner
            .conversations
            .iter()
            .map(|(id, messages)| {
                let last = messages.last();
                let peer = messages
                    .iter()
                    .find(|m| m.sender != user)
                    .map(|m| format!("user{}", m.sender))
                    .unwrap_or_else(|| "New chat".to_string());
                ConversationSummary {
                    id: *id,
                    name: peer,
                    avatar: "👤".to_string(),
                    last_message: last
                        .map(|m| m.text.clone())
                        .unwrap_or_else(|| "No messages".to_string()),
                    time: last.map(|m| time_label(m.id)).unwrap_or_default(),
                    unread: 0,
                }
            })
            .collect();

        // Most recent activity first; ids grow with time.
        let last_id = |c: &ConversationSummary| {
            inner
                .conversations
                .get(&c.id)
                .and_then(|m| m.last())
                .map(|m| m.id)
        };
        chats.sort_by(|a, b| last_id(b).cmp(&last_id(a)));
        Ok(chats)
    }

    async fn init_conversations(&self, user: UserId) -> Result<InitReport, SendError> {
        if self.inner.lock().unwrap().unreachable {
            return Err(SendError::Transport("store unreachable".into()));
        }
        Ok(self.seed(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ConversationId = ConversationId::new(1);
    const ME: UserId = UserId::new(1);
    const PEER: UserId = UserId::new(2);

    // ===========================================
    // Read / Write Tests
    // ===========================================

    #[tokio::test]
    async fn fetch_returns_messages_in_insert_order() {
        let store = MockStore::new();
        store.push_message(CHAT, PEER, "first");
        store.push_message(CHAT, ME, "second");

        let messages = store.fetch_messages(CHAT, ME).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "first");
        assert_eq!(messages[0].origin, Origin::Other);
        assert_eq!(messages[1].text, "second");
        assert_eq!(messages[1].origin, Origin::Mine);
    }

    #[tokio::test]
    async fn fetch_unknown_conversation_is_empty() {
        let store = MockStore::new();
        let messages = store.fetch_messages(CHAT, ME).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn send_appends_with_server_id() {
        let store = MockStore::new();

        let ack = store.send_message(CHAT, ME, "hello").await.unwrap();

        assert!(ack.accepted);
        let id = ack.id.unwrap();
        assert!(!id.is_local());

        let messages = store.fetch_messages(CHAT, ME).await.unwrap();
        assert_eq!(messages[0].id, id);
        assert_eq!(messages[0].text, "hello");
    }

    #[tokio::test]
    async fn origin_depends_on_reader() {
        let store = MockStore::new();
        store.push_message(CHAT, ME, "mine");

        let as_peer = store.fetch_messages(CHAT, PEER).await.unwrap();
        assert_eq!(as_peer[0].origin, Origin::Other);
    }

    // ===========================================
    // Failure Injection Tests
    // ===========================================

    #[tokio::test]
    async fn forced_fetch_failure_is_one_shot() {
        let store = MockStore::new();
        store.push_message(CHAT, PEER, "hi");
        store.fail_next_fetch("timeout");

        let result = store.fetch_messages(CHAT, ME).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));

        // Next fetch should work
        assert_eq!(store.fetch_messages(CHAT, ME).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn forced_send_failure_does_not_store() {
        let store = MockStore::new();
        store.fail_next_send("connection reset");

        let result = store.send_message(CHAT, ME, "lost").await;
        assert!(matches!(result, Err(SendError::Transport(_))));
        assert!(store.fetch_messages(CHAT, ME).await.unwrap().is_empty());
        assert_eq!(store.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn rejected_send_is_ok_but_not_accepted() {
        let store = MockStore::new();
        store.reject_next_send();

        let ack = store.send_message(CHAT, ME, "nope").await.unwrap();
        assert!(!ack.accepted);
        assert!(store.fetch_messages(CHAT, ME).await.unwrap().is_empty());

        let ack = store.send_message(CHAT, ME, "yes").await.unwrap();
        assert!(ack.accepted);
    }

    #[tokio::test]
    async fn unreachable_fails_everything() {
        let store = MockStore::new();
        store.set_unreachable(true);

        assert!(store.fetch_messages(CHAT, ME).await.is_err());
        assert!(store.send_message(CHAT, ME, "x").await.is_err());
        assert!(store.list_conversations(ME).await.is_err());

        store.set_unreachable(false);
        assert!(store.fetch_messages(CHAT, ME).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_fetch_answers_with_issue_time_state() {
        let store = MockStore::new();
        store.push_message(CHAT, PEER, "before");
        store.set_fetch_delay(CHAT, Duration::from_secs(5));

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.fetch_messages(CHAT, ME).await }
        });
        tokio::task::yield_now().await;
        store.push_message(CHAT, PEER, "after");

        let messages = pending.await.unwrap().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(store.max_concurrent_fetches(), 1);
    }

    // ===========================================
    // Chat List / Seeding Tests
    // ===========================================

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = MockStore::new();

        assert_eq!(
            store.init_conversations(ME).await.unwrap(),
            InitReport::Created { chats: 4 }
        );
        assert_eq!(
            store.init_conversations(ME).await.unwrap(),
            InitReport::AlreadyInitialized { chats: 4 }
        );
        assert_eq!(store.list_conversations(ME).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn chat_list_orders_by_recent_activity() {
        let store = MockStore::seeded(ME);
        store.push_message(ConversationId::new(2), ME, "bump");

        let chats = store.list_conversations(ME).await.unwrap();

        assert_eq!(chats[0].id, ConversationId::new(2));
        assert_eq!(chats[0].last_message, "bump");
        assert_eq!(chats[0].name, "user3");
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn clone_shares_state() {
        let store1 = MockStore::new();
        let store2 = store1.clone();

        store1.push_message(CHAT, PEER, "shared");
        store2.fetch_messages(CHAT, ME).await.unwrap();

        assert_eq!(store1.fetch_count(CHAT), 1);
        assert_eq!(store1.fetch_log(), vec![CHAT]);
    }

    #[tokio::test]
    async fn reset_clears_all() {
        let store = MockStore::seeded(ME);
        store.fail_next_fetch("x");
        store.reset();

        assert!(store.list_conversations(ME).await.unwrap().is_empty());
        assert!(store.fetch_messages(CHAT, ME).await.is_ok());
    }

    #[test]
    fn time_labels_are_clock_like() {
        assert_eq!(time_label(MessageId::new(1)), "00:01");
        assert_eq!(time_label(MessageId::new(61)), "01:01");
    }
}
